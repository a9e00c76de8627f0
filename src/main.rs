// SPDX-License-Identifier: GPL-3.0-only

use boxtrack::config::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "boxtrack")]
#[command(about = "Track what is in your storage boxes")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Config file (default: <config dir>/boxtrack/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List boxes, or search boxes and items
    List {
        /// Case-insensitive search over box names, locations, item names and notes
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Create a box
    AddBox {
        name: String,

        /// Where the box is stored
        #[arg(short, long)]
        location: Option<String>,
    },

    /// Add an item to a box
    AddItem {
        box_id: String,

        name: String,

        #[arg(short, long)]
        note: Option<String>,

        /// Quantity; anything below 1 counts as 1
        #[arg(short, long, default_value = "1")]
        qty: String,

        /// Photo to compress and attach
        #[arg(short, long)]
        photo: Option<PathBuf>,
    },

    /// Delete a box with all its items and photos
    DeleteBox { box_id: String },

    /// Delete one item and its photo
    DeleteItem { item_id: String },

    /// Print the locator URL and QR image URLs for a box
    Link { box_id: String },

    /// Compress a photo the way item photos are compressed before upload
    Compress {
        input: PathBuf,

        /// Output file or directory (default: current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Scan a QR code and look up its box
    Scan {
        /// Replay a still image instead of opening a camera
        #[arg(long, conflicts_with = "device")]
        image: Option<PathBuf>,

        /// Video device to open (default: from config)
        #[arg(long)]
        device: Option<String>,

        /// Give up after this many seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// List the cameras of the selected backend and exit
        #[arg(long)]
        list_devices: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=boxtrack=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let mut config = Config::load_from(path)?;
            config.apply_env(|key| std::env::var(key).ok());
            config
        }
        None => Config::load()?,
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(cli::run(cli.command, config))
}

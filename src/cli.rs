// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for inventory operations
//!
//! This module provides command-line functionality for:
//! - Listing and searching boxes
//! - Adding and deleting boxes and items
//! - Printing box links and QR image URLs
//! - Compressing photos
//! - Scanning a box's QR code and listing cameras

use crate::Commands;
use boxtrack::app::frame_processor::{
    ScanOutcome, ScanSession, SessionExit, default_detector, resolve_payload,
};
use boxtrack::backends::camera::{CameraBackendManager, FileSourceBackend};
use boxtrack::config::{self, Config};
use boxtrack::constants;
use boxtrack::inventory::{
    InventoryBackend, InventoryService, MemoryBackend, NewBox, NewItem, PhotoStore, RestBackend,
    StorageBox, search_boxes,
};
use boxtrack::pipelines::photo::PhotoCompressor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Run one command
pub async fn run(command: Commands, config: Config) -> CliResult {
    match command {
        Commands::Link { box_id } => {
            print_links(&config, &box_id);
            Ok(())
        }
        Commands::Compress { input, output } => compress(&config, &input, output.as_deref()).await,
        Commands::Scan {
            image,
            device,
            list_devices: true,
            ..
        } => list_cameras(&camera_manager(&config, image, device.as_deref())),
        command if config.backend.is_configured() => {
            let backend = Arc::new(RestBackend::new(&config.backend)?);
            run_inventory(InventoryService::from_backend(backend), command, &config).await
        }
        command => {
            warn!(
                "No backend configured (set {} and {}), using a temporary in-memory store",
                config::ENV_BACKEND_URL,
                config::ENV_ANON_KEY
            );
            let backend = Arc::new(MemoryBackend::new());
            run_inventory(InventoryService::from_backend(backend), command, &config).await
        }
    }
}

async fn run_inventory<D, P>(
    service: InventoryService<D, P>,
    command: Commands,
    config: &Config,
) -> CliResult
where
    D: InventoryBackend + 'static,
    P: PhotoStore + 'static,
{
    match command {
        Commands::List { search } => list_boxes(&service, search.as_deref()).await,
        Commands::AddBox { name, location } => add_box(&service, name, location).await,
        Commands::AddItem {
            box_id,
            name,
            note,
            qty,
            photo,
        } => {
            let mut item = NewItem::new(name).with_qty(NewItem::parse_qty(&qty));
            if let Some(note) = note {
                item = item.with_note(note);
            }
            add_item(&service, config, &box_id, item, photo.as_deref()).await
        }
        Commands::DeleteBox { box_id } => {
            if !service.delete_box(&box_id).await {
                return Err(format!("Failed to delete box {}", box_id).into());
            }
            println!("Box deleted: {}", box_id);
            Ok(())
        }
        Commands::DeleteItem { item_id } => {
            if !service.delete_item(&item_id).await {
                return Err(format!("Failed to delete item {}", item_id).into());
            }
            println!("Item deleted: {}", item_id);
            Ok(())
        }
        Commands::Scan {
            image,
            device,
            timeout,
            ..
        } => scan(&service, config, image, device, timeout).await,
        // Handled before a backend is opened
        Commands::Link { .. } | Commands::Compress { .. } => Ok(()),
    }
}

/// List all boxes, or the boxes and items matching `search`
async fn list_boxes<D, P>(service: &InventoryService<D, P>, search: Option<&str>) -> CliResult
where
    D: InventoryBackend,
    P: PhotoStore,
{
    let boxes = service.load_boxes().await;

    if let Some(query) = search.filter(|q| !q.trim().is_empty()) {
        let hits = search_boxes(&boxes, query);
        println!("Search results ({})", hits.len());
        if hits.is_empty() {
            println!("  Nothing matches \"{}\"", query.trim());
        }
        for hit in hits {
            print_box_line(hit.storage_box);
            for item in hit.items {
                println!("      - {}", item.name);
            }
        }
        return Ok(());
    }

    if boxes.is_empty() {
        println!("No boxes yet. Create one with 'boxtrack add-box <name>'.");
        return Ok(());
    }

    println!("{} boxes", boxes.len());
    for storage_box in &boxes {
        print_box_line(storage_box);
        for item in &storage_box.items {
            let qty = if item.qty > 1 {
                format!(" x{}", item.qty)
            } else {
                String::new()
            };
            let photo = if item.photo_url.is_some() { " [photo]" } else { "" };
            match item.note.as_deref() {
                Some(note) => println!("      - {}{}{} ({})", item.name, qty, photo, note),
                None => println!("      - {}{}{}", item.name, qty, photo),
            }
        }
    }
    Ok(())
}

fn print_box_line(storage_box: &StorageBox) {
    let location = storage_box.location.as_deref().unwrap_or("no location");
    println!(
        "  {}  {} ({}) [{} items] {}",
        storage_box.id,
        storage_box.name,
        location,
        storage_box.items.len(),
        storage_box.color_or_default()
    );
}

async fn add_box<D, P>(
    service: &InventoryService<D, P>,
    name: String,
    location: Option<String>,
) -> CliResult
where
    D: InventoryBackend,
    P: PhotoStore,
{
    let count = service.load_boxes().await.len();
    let mut new_box =
        NewBox::new(name).with_color(constants::BOX_COLORS[count % constants::BOX_COLORS.len()]);
    if let Some(location) = location {
        new_box = new_box.with_location(location);
    }

    let created = service
        .create_box(new_box)
        .await
        .ok_or("Failed to add box")?;
    println!("Box added: {} ({})", created.name, created.id);
    Ok(())
}

async fn add_item<D, P>(
    service: &InventoryService<D, P>,
    config: &Config,
    box_id: &str,
    item: NewItem,
    photo: Option<&Path>,
) -> CliResult
where
    D: InventoryBackend,
    P: PhotoStore,
{
    let photo = match photo {
        Some(path) => {
            let compressor = PhotoCompressor::new(config.photo.compress_options());
            let image = compressor.compress_file(path).await?;
            info!(
                width = image.width,
                height = image.height,
                size = image.len(),
                "Photo compressed"
            );
            Some(image)
        }
        None => None,
    };

    let created = service
        .create_item(box_id, item, photo)
        .await
        .ok_or("Failed to add item")?;
    println!("Item added: {} ({})", created.name, created.id);
    if let Some(url) = &created.photo_url {
        println!("  Photo: {}", url);
    }
    Ok(())
}

fn print_links(config: &Config, box_id: &str) {
    let locator = boxtrack::inventory::box_locator(&config.links.base_url, box_id);
    println!("Locator:  {}", locator);
    println!(
        "QR code:  {}",
        boxtrack::inventory::qr_image_url(&locator, config.links.display_size)
    );
    println!(
        "Download: {}",
        boxtrack::inventory::qr_image_url(&locator, config.links.download_size)
    );
}

async fn compress(config: &Config, input: &Path, output: Option<&Path>) -> CliResult {
    let compressor = PhotoCompressor::new(config.photo.compress_options());
    let original_size = tokio::fs::metadata(input).await?.len();

    let image = compressor.compress_file(input).await?;
    let target = output.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    let saved = compressor.save(&image, &target).await?;

    println!(
        "Saved {} ({}x{}, {} -> {} bytes)",
        saved.display(),
        image.width,
        image.height,
        original_size,
        image.len()
    );
    Ok(())
}

/// Camera for a scan: a replayed image, or the configured backend and device
fn camera_manager(
    config: &Config,
    image: Option<PathBuf>,
    device: Option<&str>,
) -> CameraBackendManager {
    match image {
        Some(path) => CameraBackendManager::with_backend(Arc::new(FileSourceBackend::new(path))),
        None => CameraBackendManager::new(
            config.camera.backend,
            device.unwrap_or(&config.camera.device),
        ),
    }
}

/// List the cameras `manager` can open
fn list_cameras(manager: &CameraBackendManager) -> CliResult {
    if !manager.is_available() {
        println!("Camera backend {} is not available.", manager.backend_type());
        return Ok(());
    }

    let cameras = match manager.enumerate_cameras() {
        Ok(cameras) => cameras,
        Err(e) => {
            info!(error = %e, "No cameras enumerated");
            println!("No cameras found.");
            return Ok(());
        }
    };

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        println!("      Path: {}", camera.path);
        if let Some(facing) = camera.facing {
            println!("      Facing: {}", facing);
        }
    }
    Ok(())
}

async fn scan<D, P>(
    service: &InventoryService<D, P>,
    config: &Config,
    image: Option<PathBuf>,
    device: Option<String>,
    timeout: Option<u64>,
) -> CliResult
where
    D: InventoryBackend,
    P: PhotoStore,
{
    let detector = default_detector().ok_or("QR decoding is not available in this build")?;

    let manager = camera_manager(config, image, device.as_deref());

    let boxes = service.load_boxes().await;

    let mut session = ScanSession::start(manager, Some(detector), config.camera.constraints());
    let token = session.token();
    ctrlc::set_handler(move || {
        token.cancel();
    })?;

    println!("Scanning... press Ctrl+C to stop");

    let payload = match timeout {
        Some(secs) => {
            match tokio::time::timeout(Duration::from_secs(secs), session.detected()).await {
                Ok(payload) => payload,
                Err(_) => {
                    println!("No code found within {}s", secs);
                    None
                }
            }
        }
        None => session.detected().await,
    };

    if let SessionExit::Failed(e) = session.close().await {
        return Err(e.into());
    }

    let Some(payload) = payload else {
        println!("Scan stopped");
        return Ok(());
    };

    match resolve_payload(&payload, &boxes) {
        ScanOutcome::Found { index, .. } => {
            let found = &boxes[index];
            println!("Found: {} ({})", found.name, found.id);
            if let Some(location) = &found.location {
                println!("  Location: {}", location);
            }
        }
        ScanOutcome::NotFound => {
            println!("No matching box found");
            println!("  Scanned: {}", payload);
        }
    }
    Ok(())
}

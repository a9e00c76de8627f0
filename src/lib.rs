// SPDX-License-Identifier: MPL-2.0

//! boxtrack - storage box inventory with QR code lookup
//!
//! This library provides the core functionality for boxtrack: boxes and
//! photographed items kept in a managed backend, QR codes that lead back to
//! a box, and a camera scanner that finds a box from its code.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Application state, message handling and scan sessions
//! - [`backends`]: Camera backend abstraction and exclusive camera access
//! - [`inventory`]: Box and item persistence, photo storage, search, links
//! - [`pipelines`]: Photo compression
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```ignore
//! // Usually driven through the command line:
//! // boxtrack list --search cable
//! // boxtrack scan --image label.png
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod inventory;
pub mod pipelines;

// Re-export commonly used types
pub use app::frame_processor::{QrDetection, ScanOutcome, ScanSession, SessionState};
pub use app::{AppDriver, AppState, Effect, Message, View};
pub use config::Config;
pub use inventory::{InventoryService, Item, StorageBox};

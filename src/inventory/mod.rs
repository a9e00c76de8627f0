// SPDX-License-Identifier: MPL-2.0

//! Box and item persistence
//!
//! Records and photos live in a managed backend: a PostgREST-style database
//! API and an object store. Both are reached through traits so the app logic
//! runs unchanged against the in-memory backend.
//!
//! ```text
//! ┌──────────────────┐
//! │ InventoryService │  ← logs failures, returns Option / bool
//! └────────┬─────────┘
//!          │
//!    ┌─────┴────────────────┐
//!    ▼                      ▼
//! InventoryBackend      PhotoStore
//!    │                      │
//!    ├── RestBackend ───────┤
//!    └── MemoryBackend ─────┘
//! ```

pub mod links;
pub mod memory;
pub mod models;
pub mod rest;
pub mod search;
pub mod service;

pub use links::{box_locator, photo_object_path, qr_image_url};
pub use memory::MemoryBackend;
pub use models::{BoxUpdate, Item, ItemRow, NewBox, NewItem, StorageBox};
pub use rest::RestBackend;
pub use search::{SearchHit, search_boxes};
pub use service::InventoryService;

use crate::errors::StoreError;
use crate::pipelines::photo::CompressedImage;
use std::future::Future;

/// Result type for backend operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Database side of the managed backend
pub trait InventoryBackend: Send + Sync {
    /// All boxes with their items, newest box first
    fn fetch_boxes(&self) -> impl Future<Output = StoreResult<Vec<StorageBox>>> + Send;

    /// Insert a box and return the stored row
    fn insert_box(&self, new_box: &NewBox) -> impl Future<Output = StoreResult<StorageBox>> + Send;

    fn update_box(&self, box_id: &str, update: &BoxUpdate) -> impl Future<Output = StoreResult<()>> + Send;

    /// Delete the box row only; items are removed separately
    fn delete_box(&self, box_id: &str) -> impl Future<Output = StoreResult<()>> + Send;

    /// Photo paths of every item in a box that has one
    fn item_photo_paths(&self, box_id: &str) -> impl Future<Output = StoreResult<Vec<String>>> + Send;

    fn delete_items_in_box(&self, box_id: &str) -> impl Future<Output = StoreResult<()>> + Send;

    /// Insert an item and return the stored row
    fn insert_item(&self, row: &ItemRow) -> impl Future<Output = StoreResult<Item>> + Send;

    /// Photo path of one item, `None` if it has no photo
    fn item_photo_path(&self, item_id: &str) -> impl Future<Output = StoreResult<Option<String>>> + Send;

    fn delete_item(&self, item_id: &str) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Object storage side of the managed backend
pub trait PhotoStore: Send + Sync {
    /// Store a photo at `path` without overwriting; returns the stored path
    fn upload(&self, path: &str, image: &CompressedImage) -> impl Future<Output = StoreResult<String>> + Send;

    /// Public URL of a stored object
    fn public_url(&self, path: &str) -> String;

    /// Remove objects; missing paths are not an error
    fn remove(&self, paths: &[String]) -> impl Future<Output = StoreResult<()>> + Send;
}

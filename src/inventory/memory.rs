// SPDX-License-Identifier: GPL-3.0-only

//! In-process backend
//!
//! Used when no managed backend is configured and in tests. Behaves like the
//! REST backend: newest boxes first, generated ids and timestamps, uploads
//! refuse to overwrite.

use super::models::{BoxUpdate, Item, ItemRow, NewBox, StorageBox};
use super::{InventoryBackend, PhotoStore, StoreResult};
use crate::errors::StoreError;
use crate::pipelines::photo::CompressedImage;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    /// Insertion order
    boxes: Vec<StorageBox>,
    items: Vec<Item>,
    photos: HashMap<String, CompressedImage>,
}

/// Inventory and photo storage held in memory
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Http("in-memory store poisoned".to_string()))
    }

    /// Stored photo bytes, if any
    pub fn photo(&self, path: &str) -> Option<CompressedImage> {
        self.state.lock().ok()?.photos.get(path).cloned()
    }

    pub fn photo_count(&self) -> usize {
        self.state.lock().map(|s| s.photos.len()).unwrap_or(0)
    }

    pub fn item_count(&self) -> usize {
        self.state.lock().map(|s| s.items.len()).unwrap_or(0)
    }
}

impl InventoryBackend for MemoryBackend {
    async fn fetch_boxes(&self) -> StoreResult<Vec<StorageBox>> {
        let state = self.lock()?;
        let mut boxes: Vec<StorageBox> = state
            .boxes
            .iter()
            .rev()
            .map(|b| StorageBox {
                items: state
                    .items
                    .iter()
                    .filter(|i| i.box_id == b.id)
                    .cloned()
                    .collect(),
                ..b.clone()
            })
            .collect();
        // Stable: equal timestamps keep newest-inserted first
        boxes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(boxes)
    }

    async fn insert_box(&self, new_box: &NewBox) -> StoreResult<StorageBox> {
        let stored = StorageBox {
            id: Uuid::new_v4().to_string(),
            name: new_box.name.clone(),
            location: new_box.location.clone(),
            color: new_box.color.clone(),
            created_at: Some(Utc::now()),
            items: Vec::new(),
        };
        self.lock()?.boxes.push(stored.clone());
        debug!(id = %stored.id, "Inserted box");
        Ok(stored)
    }

    async fn update_box(&self, box_id: &str, update: &BoxUpdate) -> StoreResult<()> {
        let mut state = self.lock()?;
        let target = state
            .boxes
            .iter_mut()
            .find(|b| b.id == box_id)
            .ok_or_else(|| StoreError::NotFound(format!("box {}", box_id)))?;
        update.apply_to(target);
        Ok(())
    }

    async fn delete_box(&self, box_id: &str) -> StoreResult<()> {
        let mut state = self.lock()?;
        state.boxes.retain(|b| b.id != box_id);
        // Mirrors the foreign key cascade
        state.items.retain(|i| i.box_id != box_id);
        Ok(())
    }

    async fn item_photo_paths(&self, box_id: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .lock()?
            .items
            .iter()
            .filter(|i| i.box_id == box_id)
            .filter_map(|i| i.photo_path.clone())
            .collect())
    }

    async fn delete_items_in_box(&self, box_id: &str) -> StoreResult<()> {
        self.lock()?.items.retain(|i| i.box_id != box_id);
        Ok(())
    }

    async fn insert_item(&self, row: &ItemRow) -> StoreResult<Item> {
        let mut state = self.lock()?;
        if !state.boxes.iter().any(|b| b.id == row.box_id) {
            return Err(StoreError::Status {
                status: 409,
                message: format!("box {} does not exist", row.box_id),
            });
        }
        let item = Item {
            id: Uuid::new_v4().to_string(),
            box_id: row.box_id.clone(),
            name: row.name.clone(),
            note: row.note.clone(),
            qty: row.qty,
            photo_url: row.photo_url.clone(),
            photo_path: row.photo_path.clone(),
            created_at: Some(Utc::now()),
        };
        state.items.push(item.clone());
        Ok(item)
    }

    async fn item_photo_path(&self, item_id: &str) -> StoreResult<Option<String>> {
        let state = self.lock()?;
        let item = state
            .items
            .iter()
            .find(|i| i.id == item_id)
            .ok_or_else(|| StoreError::NotFound(format!("item {}", item_id)))?;
        Ok(item.photo_path.clone())
    }

    async fn delete_item(&self, item_id: &str) -> StoreResult<()> {
        self.lock()?.items.retain(|i| i.id != item_id);
        Ok(())
    }
}

impl PhotoStore for MemoryBackend {
    async fn upload(&self, path: &str, image: &CompressedImage) -> StoreResult<String> {
        let mut state = self.lock()?;
        if state.photos.contains_key(path) {
            return Err(StoreError::Conflict(path.to_string()));
        }
        state.photos.insert(path.to_string(), image.clone());
        Ok(path.to_string())
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://item-photos/{}", path)
    }

    async fn remove(&self, paths: &[String]) -> StoreResult<()> {
        let mut state = self.lock()?;
        for path in paths {
            state.photos.remove(path);
        }
        Ok(())
    }
}

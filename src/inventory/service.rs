// SPDX-License-Identifier: GPL-3.0-only

//! Inventory operations used by the app and the CLI
//!
//! Backend errors stop here: they are logged and turned into `None`/`false`
//! so callers keep their previous state and show a generic failure.

use super::links::photo_object_path;
use super::models::{BoxUpdate, Item, ItemRow, NewBox, NewItem, StorageBox};
use super::{InventoryBackend, PhotoStore};
use crate::pipelines::photo::CompressedImage;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Inventory operations over a database backend `D` and a photo store `P`
pub struct InventoryService<D, P> {
    db: Arc<D>,
    photos: Arc<P>,
}

impl<D, P> Clone for InventoryService<D, P> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            photos: Arc::clone(&self.photos),
        }
    }
}

impl<B> InventoryService<B, B>
where
    B: InventoryBackend + PhotoStore,
{
    /// Service over one backend that stores both records and photos
    pub fn from_backend(backend: Arc<B>) -> Self {
        Self {
            db: Arc::clone(&backend),
            photos: backend,
        }
    }
}

impl<D, P> InventoryService<D, P>
where
    D: InventoryBackend,
    P: PhotoStore,
{
    pub fn new(db: Arc<D>, photos: Arc<P>) -> Self {
        Self { db, photos }
    }

    /// All boxes with items, newest first; empty on failure
    pub async fn load_boxes(&self) -> Vec<StorageBox> {
        match self.db.fetch_boxes().await {
            Ok(boxes) => boxes,
            Err(e) => {
                error!(error = %e, "Failed to fetch boxes");
                Vec::new()
            }
        }
    }

    /// Create a box; `None` on a blank name or backend failure
    pub async fn create_box(&self, new_box: NewBox) -> Option<StorageBox> {
        let Some(new_box) = new_box.normalized() else {
            warn!("Refusing to create a box without a name");
            return None;
        };
        match self.db.insert_box(&new_box).await {
            Ok(created) => {
                info!(id = %created.id, name = %created.name, "Created box");
                Some(created)
            }
            Err(e) => {
                error!(error = %e, "Failed to create box");
                None
            }
        }
    }

    pub async fn update_box(&self, box_id: &str, update: BoxUpdate) -> bool {
        if update.is_empty() {
            return true;
        }
        match self.db.update_box(box_id, &update).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, box_id, "Failed to update box");
                false
            }
        }
    }

    /// Delete a box with its items and their photos
    ///
    /// Photo and item cleanup failures are logged and do not stop the box
    /// deletion; only the box delete decides the result.
    pub async fn delete_box(&self, box_id: &str) -> bool {
        match self.db.item_photo_paths(box_id).await {
            Ok(paths) if !paths.is_empty() => {
                if let Err(e) = self.photos.remove(&paths).await {
                    warn!(error = %e, box_id, "Failed to remove item photos");
                }
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, box_id, "Failed to list item photos"),
        }

        if let Err(e) = self.db.delete_items_in_box(box_id).await {
            warn!(error = %e, box_id, "Failed to delete items");
        }

        match self.db.delete_box(box_id).await {
            Ok(()) => {
                info!(box_id, "Deleted box");
                true
            }
            Err(e) => {
                error!(error = %e, box_id, "Failed to delete box");
                false
            }
        }
    }

    /// Create an item, uploading its photo first
    ///
    /// A failed upload is logged and the item is stored without a photo.
    pub async fn create_item(
        &self,
        box_id: &str,
        item: NewItem,
        photo: Option<CompressedImage>,
    ) -> Option<Item> {
        if item.name.trim().is_empty() {
            warn!("Refusing to create an item without a name");
            return None;
        }
        let mut row = ItemRow::new(box_id, item);

        if let Some(photo) = photo {
            let path = photo_object_path(box_id, chrono::Utc::now().timestamp_millis());
            match self.photos.upload(&path, &photo).await {
                Ok(stored) => {
                    row.photo_url = Some(self.photos.public_url(&stored));
                    row.photo_path = Some(stored);
                }
                Err(e) => error!(error = %e, path, "Photo upload failed, saving item without photo"),
            }
        }

        match self.db.insert_item(&row).await {
            Ok(created) => {
                info!(id = %created.id, box_id, "Created item");
                Some(created)
            }
            Err(e) => {
                error!(error = %e, box_id, "Failed to create item");
                None
            }
        }
    }

    /// Delete an item and its stored photo
    pub async fn delete_item(&self, item_id: &str) -> bool {
        match self.db.item_photo_path(item_id).await {
            Ok(Some(path)) => {
                if let Err(e) = self.photos.remove(&[path]).await {
                    warn!(error = %e, item_id, "Failed to remove item photo");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, item_id, "Failed to look up item photo"),
        }

        match self.db.delete_item(item_id).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, item_id, "Failed to delete item");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StoreError;
    use crate::inventory::{MemoryBackend, StoreResult};

    struct RejectingPhotos;

    impl PhotoStore for RejectingPhotos {
        async fn upload(&self, _path: &str, _image: &CompressedImage) -> StoreResult<String> {
            Err(StoreError::Status {
                status: 413,
                message: "payload too large".into(),
            })
        }

        fn public_url(&self, path: &str) -> String {
            format!("rejecting://{}", path)
        }

        async fn remove(&self, _paths: &[String]) -> StoreResult<()> {
            Ok(())
        }
    }

    fn jpeg() -> CompressedImage {
        CompressedImage {
            data: vec![0xFF, 0xD8, 0xFF, 0xD9],
            mime_type: "image/jpeg".into(),
            width: 1,
            height: 1,
        }
    }

    #[tokio::test]
    async fn test_item_with_photo_gets_path_and_url() {
        let backend = Arc::new(MemoryBackend::new());
        let service = InventoryService::from_backend(Arc::clone(&backend));
        let b = service.create_box(NewBox::new("Camping")).await.unwrap();

        let item = service
            .create_item(&b.id, NewItem::new("Tent"), Some(jpeg()))
            .await
            .unwrap();
        let path = item.photo_path.clone().unwrap();
        assert!(path.starts_with(&format!("{}/", b.id)));
        assert!(path.ends_with(".jpg"));
        assert_eq!(item.photo_url.as_deref(), Some(backend.public_url(&path).as_str()));
        assert!(backend.photo(&path).is_some());
    }

    #[tokio::test]
    async fn test_upload_failure_still_saves_item() {
        let db = Arc::new(MemoryBackend::new());
        let service = InventoryService::new(Arc::clone(&db), Arc::new(RejectingPhotos));
        let b = service.create_box(NewBox::new("Garage")).await.unwrap();

        let item = service
            .create_item(&b.id, NewItem::new("Drill").with_qty(2), Some(jpeg()))
            .await
            .unwrap();
        assert_eq!(item.photo_path, None);
        assert_eq!(item.photo_url, None);
        assert_eq!(item.qty, 2);
    }

    #[tokio::test]
    async fn test_delete_box_removes_items_and_photos() {
        let backend = Arc::new(MemoryBackend::new());
        let service = InventoryService::from_backend(Arc::clone(&backend));
        let b = service.create_box(NewBox::new("Toys")).await.unwrap();
        service
            .create_item(&b.id, NewItem::new("Ball"), Some(jpeg()))
            .await
            .unwrap();
        service.create_item(&b.id, NewItem::new("Kite"), None).await.unwrap();
        assert_eq!(backend.photo_count(), 1);

        assert!(service.delete_box(&b.id).await);
        assert_eq!(backend.photo_count(), 0);
        assert_eq!(backend.item_count(), 0);
        assert!(service.load_boxes().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_item_removes_photo() {
        let backend = Arc::new(MemoryBackend::new());
        let service = InventoryService::from_backend(Arc::clone(&backend));
        let b = service.create_box(NewBox::new("Books")).await.unwrap();
        let item = service
            .create_item(&b.id, NewItem::new("Atlas"), Some(jpeg()))
            .await
            .unwrap();

        assert!(service.delete_item(&item.id).await);
        assert_eq!(backend.photo_count(), 0);
        assert!(service.load_boxes().await[0].items.is_empty());
    }

    #[tokio::test]
    async fn test_blank_names_are_rejected() {
        let service = InventoryService::from_backend(Arc::new(MemoryBackend::new()));
        assert!(service.create_box(NewBox::new("  ")).await.is_none());
        let b = service.create_box(NewBox::new("Box")).await.unwrap();
        assert!(service.create_item(&b.id, NewItem::new(" "), None).await.is_none());
    }

    #[tokio::test]
    async fn test_update_unknown_box_fails() {
        let service = InventoryService::from_backend(Arc::new(MemoryBackend::new()));
        let update = BoxUpdate {
            name: Some("Renamed".into()),
            ..Default::default()
        };
        assert!(!service.update_box("nope", update).await);
    }
}

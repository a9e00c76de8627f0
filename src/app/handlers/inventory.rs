// SPDX-License-Identifier: GPL-3.0-only

//! Box and item handlers
//!
//! Writes set `syncing` and are refused while another write is in flight.
//! A write answers with the refreshed box list, or `None` when the backend
//! refused it; a refused write leaves the screen as it was.

use crate::app::state::{AppState, Effect, ToastKind, View};
use crate::inventory::{BoxUpdate, NewBox, StorageBox};
use crate::pipelines::photo::CompressedImage;
use std::path::PathBuf;
use tracing::{debug, info, warn};

impl AppState {
    // =========================================================================
    // Boxes
    // =========================================================================

    pub(crate) fn handle_submit_box(&mut self) -> Vec<Effect> {
        if !self.add_box.can_submit(self.syncing) {
            debug!(syncing = self.syncing, "Add box refused");
            return Vec::new();
        }
        let new_box = NewBox::new(self.add_box.name.trim())
            .with_location(self.add_box.location.trim())
            .with_color(self.next_box_color());
        self.syncing = true;
        vec![Effect::CreateBox(new_box)]
    }

    pub(crate) fn handle_box_created(&mut self, result: Option<Vec<StorageBox>>) -> Vec<Effect> {
        self.syncing = false;
        match result {
            Some(boxes) => {
                self.boxes = boxes;
                self.add_box = Default::default();
                self.view = View::Home;
                vec![self.show_toast("Box added!", ToastKind::Success)]
            }
            None => vec![self.show_toast("Failed to add box", ToastKind::Warn)],
        }
    }

    pub(crate) fn handle_update_box(&mut self, update: BoxUpdate) -> Vec<Effect> {
        let Some(box_id) = self.view.box_id().map(str::to_string) else {
            return Vec::new();
        };
        if update.is_empty() {
            return Vec::new();
        }
        vec![Effect::UpdateBox { box_id, update }]
    }

    pub(crate) fn handle_box_updated(&mut self, result: Option<Vec<StorageBox>>) -> Vec<Effect> {
        match result {
            Some(boxes) => {
                self.boxes = boxes;
                Vec::new()
            }
            None => vec![self.show_toast("Failed to update box", ToastKind::Warn)],
        }
    }

    pub(crate) fn handle_confirm_delete_box(&mut self) -> Vec<Effect> {
        let Some(box_id) = self.view.box_id().map(str::to_string) else {
            return Vec::new();
        };
        if self.syncing {
            return Vec::new();
        }
        info!(box_id = %box_id, "Deleting box");
        self.syncing = true;
        vec![Effect::DeleteBox(box_id)]
    }

    pub(crate) fn handle_box_deleted(&mut self, result: Option<Vec<StorageBox>>) -> Vec<Effect> {
        self.syncing = false;
        let Some(boxes) = result else {
            self.detail.confirm_delete = false;
            return vec![self.show_toast("Failed to delete box", ToastKind::Warn)];
        };
        self.boxes = boxes;
        self.detail = Default::default();
        self.view = View::Home;
        vec![self.show_toast("Box deleted", ToastKind::Warn)]
    }

    // =========================================================================
    // Items
    // =========================================================================

    pub(crate) fn handle_toggle_add_item(&mut self) -> Vec<Effect> {
        let form = &mut self.detail.add_item;
        form.open = !form.open;
        if !form.open {
            form.photo = None;
        }
        Vec::new()
    }

    pub(crate) fn handle_item_photo_selected(&mut self, path: PathBuf) -> Vec<Effect> {
        if self.view.box_id().is_none() {
            return Vec::new();
        }
        self.detail.add_item.compressing = true;
        vec![Effect::CompressPhoto(path)]
    }

    pub(crate) fn handle_item_photo_compressed(
        &mut self,
        result: Result<CompressedImage, String>,
    ) -> Vec<Effect> {
        self.detail.add_item.compressing = false;
        match result {
            Ok(photo) => {
                debug!(
                    width = photo.width,
                    height = photo.height,
                    size = photo.len(),
                    "Item photo ready"
                );
                self.detail.add_item.photo = Some(photo);
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Item photo could not be compressed");
                vec![self.show_toast("Could not read photo", ToastKind::Warn)]
            }
        }
    }

    pub(crate) fn handle_submit_item(&mut self) -> Vec<Effect> {
        let Some(box_id) = self.view.box_id().map(str::to_string) else {
            return Vec::new();
        };
        let form = &self.detail.add_item;
        if !form.can_submit(self.syncing) {
            debug!(syncing = self.syncing, "Add item refused");
            return Vec::new();
        }
        let effect = Effect::CreateItem {
            box_id,
            item: form.to_new_item(),
            photo: form.photo.clone(),
        };
        self.syncing = true;
        vec![effect]
    }

    pub(crate) fn handle_item_created(&mut self, result: Option<Vec<StorageBox>>) -> Vec<Effect> {
        self.syncing = false;
        self.detail.add_item.reset_fields();
        match result {
            Some(boxes) => {
                self.boxes = boxes;
                vec![self.show_toast("Item added!", ToastKind::Success)]
            }
            None => vec![self.show_toast("Failed to add item", ToastKind::Warn)],
        }
    }

    pub(crate) fn handle_delete_item(&mut self, item_id: String) -> Vec<Effect> {
        if self.syncing {
            return Vec::new();
        }
        self.syncing = true;
        vec![Effect::DeleteItem(item_id)]
    }

    pub(crate) fn handle_item_deleted(&mut self, result: Option<Vec<StorageBox>>) -> Vec<Effect> {
        self.syncing = false;
        match result {
            Some(boxes) => {
                self.boxes = boxes;
                Vec::new()
            }
            None => vec![self.show_toast("Failed to delete item", ToastKind::Warn)],
        }
    }
}

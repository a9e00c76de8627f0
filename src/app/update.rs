// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! `update()` is a dispatcher: it routes each message to a handler in the
//! `handlers` submodules and returns the effects the driver should run.
//!
//! # Handler Modules
//!
//! - `handlers::navigation`: views, search, overlays, toasts, loading
//! - `handlers::inventory`: box and item forms and their backend writes
//! - `handlers::scanner`: scanner overlay and scan results

use crate::app::state::{AppState, Effect, Message};

impl AppState {
    /// Apply a message and return follow-up work
    pub fn update(&mut self, message: Message) -> Vec<Effect> {
        match message {
            // ===== Navigation =====
            Message::OpenBox(box_id) => self.open_box(&box_id),
            Message::GoHome => self.go_home(),
            Message::StartAddBox => self.start_add_box(),
            Message::Cancel => self.cancel(),
            Message::SearchChanged(text) => {
                self.search = text;
                Vec::new()
            }
            Message::ClearSearch => {
                self.search.clear();
                Vec::new()
            }

            // ===== Data =====
            Message::BoxesLoaded(boxes) => self.handle_boxes_loaded(boxes),

            // ===== Add box =====
            Message::AddBoxNameChanged(name) => {
                self.add_box.name = name;
                Vec::new()
            }
            Message::AddBoxLocationChanged(location) => {
                self.add_box.location = location;
                Vec::new()
            }
            Message::SubmitBox => self.handle_submit_box(),
            Message::BoxCreated(result) => self.handle_box_created(result),

            // ===== Box detail =====
            Message::ToggleQr => {
                self.detail.show_qr = !self.detail.show_qr;
                Vec::new()
            }
            Message::ToggleAddItem => self.handle_toggle_add_item(),
            Message::SetItemLayout(layout) => {
                self.detail.layout = layout;
                Vec::new()
            }
            Message::UpdateBox(update) => self.handle_update_box(update),
            Message::BoxUpdated(result) => self.handle_box_updated(result),
            Message::RequestDeleteBox => {
                self.detail.confirm_delete = true;
                Vec::new()
            }
            Message::CancelDeleteBox => {
                self.detail.confirm_delete = false;
                Vec::new()
            }
            Message::ConfirmDeleteBox => self.handle_confirm_delete_box(),
            Message::BoxDeleted(result) => self.handle_box_deleted(result),

            // ===== Items =====
            Message::ItemNameChanged(name) => {
                self.detail.add_item.name = name;
                Vec::new()
            }
            Message::ItemNoteChanged(note) => {
                self.detail.add_item.note = note;
                Vec::new()
            }
            Message::ItemQtyChanged(qty) => {
                self.detail.add_item.qty = qty;
                Vec::new()
            }
            Message::ItemPhotoSelected(path) => self.handle_item_photo_selected(path),
            Message::ItemPhotoCompressed(result) => self.handle_item_photo_compressed(result),
            Message::RemoveItemPhoto => {
                self.detail.add_item.photo = None;
                Vec::new()
            }
            Message::SubmitItem => self.handle_submit_item(),
            Message::ItemCreated(result) => self.handle_item_created(result),
            Message::DeleteItem(item_id) => self.handle_delete_item(item_id),
            Message::ItemDeleted(result) => self.handle_item_deleted(result),

            // ===== Scanner =====
            Message::OpenScanner => self.handle_open_scanner(),
            Message::CloseScanner => self.handle_close_scanner(),
            Message::ScannerStateChanged { scan_id, state } => {
                self.handle_scanner_state(scan_id, state)
            }
            Message::ScanResult { scan_id, payload } => self.handle_scan_result(scan_id, &payload),
            Message::ScannerEnded(scan_id) => self.handle_scanner_ended(scan_id),

            // ===== Overlays =====
            Message::OpenLightbox(src) => {
                self.lightbox = Some(src);
                Vec::new()
            }
            Message::CloseLightbox => {
                self.lightbox = None;
                Vec::new()
            }
            Message::ToastExpired(id) => {
                if self.toast.as_ref().is_some_and(|t| t.id == id) {
                    self.toast = None;
                }
                Vec::new()
            }
        }
    }
}

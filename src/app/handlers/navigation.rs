// SPDX-License-Identifier: GPL-3.0-only

//! Navigation handlers
//!
//! View transitions with their entry and exit actions, plus the initial load.

use crate::app::state::{AppState, DetailState, Effect, View};
use crate::inventory::StorageBox;
use tracing::{debug, info};

impl AppState {
    // =========================================================================
    // View Transitions
    // =========================================================================

    /// Enter the detail view of a box
    pub(crate) fn open_box(&mut self, box_id: &str) -> Vec<Effect> {
        if self.find_box(box_id).is_none() {
            debug!(box_id, "Ignoring open of unknown box");
            return Vec::new();
        }
        self.detail = DetailState::default();
        self.view = View::BoxDetail {
            box_id: box_id.to_string(),
        };
        Vec::new()
    }

    /// Back to the box list; leaving a screen clears the search
    pub(crate) fn go_home(&mut self) -> Vec<Effect> {
        self.search.clear();
        self.leave_current_view();
        self.view = View::Home;
        Vec::new()
    }

    pub(crate) fn start_add_box(&mut self) -> Vec<Effect> {
        self.leave_current_view();
        self.add_box = Default::default();
        self.view = View::AddBox;
        Vec::new()
    }

    /// Abandon the add box form
    pub(crate) fn cancel(&mut self) -> Vec<Effect> {
        if self.view == View::AddBox {
            self.leave_current_view();
            self.view = View::Home;
        }
        Vec::new()
    }

    fn leave_current_view(&mut self) {
        match self.view {
            View::BoxDetail { .. } => self.detail = DetailState::default(),
            View::AddBox => self.add_box = Default::default(),
            View::Home => {}
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    pub(crate) fn handle_boxes_loaded(&mut self, boxes: Vec<StorageBox>) -> Vec<Effect> {
        info!(count = boxes.len(), "Boxes loaded");
        self.boxes = boxes;
        self.loaded = true;

        if let Some(box_id) = self.deep_link.take() {
            if self.find_box(&box_id).is_some() {
                info!(box_id = %box_id, "Opening box from link");
                return self.open_box(&box_id);
            }
            debug!(box_id = %box_id, "Linked box not found");
        }
        Vec::new()
    }
}

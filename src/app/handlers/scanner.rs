// SPDX-License-Identifier: GPL-3.0-only

//! Scanner overlay handlers

use crate::app::frame_processor::{ScanOutcome, SessionState, resolve_payload};
use crate::app::state::{AppState, Effect, ToastKind};
use tracing::{debug, info, warn};

impl AppState {
    pub(crate) fn handle_open_scanner(&mut self) -> Vec<Effect> {
        if self.scanner.open {
            return Vec::new();
        }
        self.scanner.open = true;
        self.scanner.scan_id += 1;
        self.scanner.session = Some(SessionState::Starting);
        vec![Effect::StartScan(self.scanner.scan_id)]
    }

    pub(crate) fn handle_close_scanner(&mut self) -> Vec<Effect> {
        if !self.scanner.open {
            return Vec::new();
        }
        self.scanner.open = false;
        self.scanner.session = None;
        vec![Effect::StopScan]
    }

    pub(crate) fn handle_scanner_state(
        &mut self,
        scan_id: u64,
        state: SessionState,
    ) -> Vec<Effect> {
        if !self.scanner.is_current(scan_id) {
            return Vec::new();
        }
        if let SessionState::Error(cause) = &state {
            warn!(cause = %cause, "Scanner could not start");
        }
        self.scanner.session = Some(state);
        Vec::new()
    }

    /// Close the scanner and look the payload up among the loaded boxes
    pub(crate) fn handle_scan_result(&mut self, scan_id: u64, payload: &str) -> Vec<Effect> {
        if !self.scanner.is_current(scan_id) {
            debug!(scan_id, "Ignoring result of a closed scan session");
            return Vec::new();
        }
        self.scanner.open = false;
        self.scanner.session = None;
        let mut effects = vec![Effect::StopScan];

        match resolve_payload(payload, &self.boxes) {
            ScanOutcome::Found { index, box_id } => {
                let name = self.boxes[index].name.clone();
                info!(box_id = %box_id, "Scanned box");
                effects.extend(self.open_box(&box_id));
                effects.push(self.show_toast(format!("Found: {}", name), ToastKind::Success));
            }
            ScanOutcome::NotFound => {
                info!(payload, "Scanned code matches no box");
                effects.push(self.show_toast("No matching box found", ToastKind::Warn));
            }
        }
        effects
    }

    /// The session finished without a payload while the overlay is still up
    pub(crate) fn handle_scanner_ended(&mut self, scan_id: u64) -> Vec<Effect> {
        if !self.scanner.is_current(scan_id) {
            return Vec::new();
        }
        if !self.scanner.session.as_ref().is_some_and(SessionState::is_terminal) {
            self.scanner.session = Some(SessionState::Error("Camera stream ended".to_string()));
        }
        Vec::new()
    }
}

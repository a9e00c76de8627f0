// SPDX-License-Identifier: GPL-3.0-only

//! Effect driver
//!
//! Runs the [`Effect`]s produced by [`AppState::update`] against the inventory
//! service, the photo compressor and the camera. Backend work is awaited and
//! answered with a message; long-running work (scans, toast timers) reports
//! back through the message channel returned by [`AppDriver::new`].

use crate::app::frame_processor::{Detector, ScanSession, ScanToken, SessionState};
use crate::app::state::{AppState, Effect, Message};
use crate::backends::camera::{CameraBackendManager, StreamConstraints};
use crate::inventory::{InventoryBackend, InventoryService, PhotoStore, StorageBox};
use crate::pipelines::photo::PhotoCompressor;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

pub struct AppDriver<D, P> {
    service: InventoryService<D, P>,
    compressor: PhotoCompressor,
    camera: CameraBackendManager,
    detector: Option<Arc<dyn Detector>>,
    constraints: StreamConstraints,
    messages: mpsc::UnboundedSender<Message>,
    /// Token of the running scan session
    scan: Option<ScanToken>,
}

impl<D, P> AppDriver<D, P>
where
    D: InventoryBackend + 'static,
    P: PhotoStore + 'static,
{
    /// Create a driver and the receiver for messages produced in the background
    pub fn new(
        service: InventoryService<D, P>,
        compressor: PhotoCompressor,
        camera: CameraBackendManager,
        detector: Option<Arc<dyn Detector>>,
        constraints: StreamConstraints,
    ) -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let driver = Self {
            service,
            compressor,
            camera,
            detector,
            constraints,
            messages: tx,
            scan: None,
        };
        (driver, rx)
    }

    pub fn service(&self) -> &InventoryService<D, P> {
        &self.service
    }

    /// Whether a scan session is running
    pub fn is_scanning(&self) -> bool {
        self.scan.as_ref().is_some_and(ScanToken::is_active)
    }

    /// Apply `message` and run the resulting effects until none are left
    ///
    /// Messages produced later in the background arrive on the channel and
    /// are fed back through this method by the caller.
    pub async fn dispatch(&mut self, state: &mut AppState, message: Message) {
        let mut queue = VecDeque::from([message]);
        while let Some(message) = queue.pop_front() {
            for effect in state.update(message) {
                if let Some(follow_up) = self.run(effect).await {
                    queue.push_back(follow_up);
                }
            }
        }
    }

    /// Run one effect
    pub async fn run(&mut self, effect: Effect) -> Option<Message> {
        match effect {
            Effect::LoadBoxes => Some(Message::BoxesLoaded(self.service.load_boxes().await)),
            Effect::CreateBox(new_box) => {
                let created = self.service.create_box(new_box).await;
                match created {
                    Some(_) => Some(Message::BoxCreated(Some(self.service.load_boxes().await))),
                    None => Some(Message::BoxCreated(None)),
                }
            }
            Effect::UpdateBox { box_id, update } => {
                let updated = self.service.update_box(&box_id, update).await;
                Some(Message::BoxUpdated(self.refreshed_if(updated).await))
            }
            Effect::DeleteBox(box_id) => {
                let deleted = self.service.delete_box(&box_id).await;
                Some(Message::BoxDeleted(self.refreshed_if(deleted).await))
            }
            Effect::CompressPhoto(path) => {
                let result = self
                    .compressor
                    .compress_file(&path)
                    .await
                    .map_err(|e| e.to_string());
                Some(Message::ItemPhotoCompressed(result))
            }
            Effect::CreateItem { box_id, item, photo } => {
                let created = self.service.create_item(&box_id, item, photo).await;
                match created {
                    Some(_) => Some(Message::ItemCreated(Some(self.service.load_boxes().await))),
                    None => Some(Message::ItemCreated(None)),
                }
            }
            Effect::DeleteItem(item_id) => {
                let deleted = self.service.delete_item(&item_id).await;
                Some(Message::ItemDeleted(self.refreshed_if(deleted).await))
            }
            Effect::StartScan(scan_id) => {
                self.start_scan(scan_id);
                None
            }
            Effect::StopScan => {
                if let Some(token) = self.scan.take() {
                    if token.cancel() {
                        debug!("Scan cancelled");
                    }
                }
                None
            }
            Effect::ExpireToast { id, after } => {
                let tx = self.messages.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    let _ = tx.send(Message::ToastExpired(id));
                });
                None
            }
        }
    }

    /// The refreshed box list after a successful write
    async fn refreshed_if(&self, ok: bool) -> Option<Vec<StorageBox>> {
        if ok {
            Some(self.service.load_boxes().await)
        } else {
            None
        }
    }

    fn start_scan(&mut self, scan_id: u64) {
        if let Some(previous) = self.scan.take() {
            previous.cancel();
        }
        let session = ScanSession::start(
            self.camera.clone(),
            self.detector.clone(),
            self.constraints.clone(),
        );
        self.scan = Some(session.token());
        tokio::spawn(forward_scan(scan_id, session, self.messages.clone()));
    }
}

/// Report state changes and the outcome of a session, then release it
///
/// Every message is tagged with `scan_id` so reports that outlive a closed
/// scanner are ignored by a newer one.
async fn forward_scan(
    scan_id: u64,
    mut session: ScanSession,
    tx: mpsc::UnboundedSender<Message>,
) {
    let mut states = session.subscribe_state();
    let payload = {
        let detected = session.detected();
        tokio::pin!(detected);
        loop {
            tokio::select! {
                payload = &mut detected => break payload,
                changed = states.changed() => {
                    if changed.is_err() {
                        break (&mut detected).await;
                    }
                    let state: SessionState = states.borrow_and_update().clone();
                    let _ = tx.send(Message::ScannerStateChanged { scan_id, state });
                }
            }
        }
    };

    if payload.is_none() {
        // The final state can race the end of the payload channel
        if let state @ SessionState::Error(_) = session.state() {
            let _ = tx.send(Message::ScannerStateChanged { scan_id, state });
        }
    }

    let exit = session.close().await;
    info!(scan_id, exit = ?exit, "Scan session finished");

    let message = match payload {
        Some(payload) => Message::ScanResult { scan_id, payload },
        None => Message::ScannerEnded(scan_id),
    };
    let _ = tx.send(message);
}

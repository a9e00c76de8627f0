// SPDX-License-Identifier: GPL-3.0-only

//! Camera capture session for one scan attempt
//!
//! A session acquires the camera, runs the detection loop over its frames
//! and releases the camera exactly once, whichever comes first of a
//! detection, a `stop()`, or the session being dropped.
//!
//! State machine:
//!
//! ```text
//!            acquire ok + detector   ┌──────────┐
//!        ┌──────────────────────────▶│ Scanning │
//!        │                           └──────────┘
//! ┌──────┴───┐ acquire ok, no detector ┌─────────────────────┐
//! │ Starting ├────────────────────────▶│ NoDetectorAvailable │
//! └──────┬───┘                         └─────────────────────┘
//!        │ acquire failed               ┌──────────────┐
//!        └─────────────────────────────▶│ Error(cause) │
//!                                       └──────────────┘
//! ```

use super::scan_loop::{DetectionLoop, LoopExit, ScanToken};
use super::tasks::Detector;
use crate::backends::camera::{
    CameraBackendManager, FrameSubscription, LiveStream, StreamConstraints,
};
use crate::errors::CameraError;
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Observable state of a scan session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the camera
    Starting,
    /// Frames are being decoded
    Scanning,
    /// Camera is live but no QR decoder is compiled in
    NoDetectorAvailable,
    /// Camera could not be acquired; terminal
    Error(String),
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// How a session's task ended
#[derive(Debug, Clone)]
pub enum SessionExit {
    /// A payload was delivered
    Detected,
    /// Stopped by the caller before anything was detected
    Cancelled,
    /// The camera stopped producing frames
    StreamEnded,
    /// The camera could not be acquired
    Failed(CameraError),
}

/// Handle to a running scan
///
/// Must be started inside a tokio runtime. Dropping the handle cancels the
/// scan; the background task then releases the camera.
pub struct ScanSession {
    token: ScanToken,
    state: watch::Receiver<SessionState>,
    preview: watch::Receiver<Option<FrameSubscription>>,
    detected: Option<oneshot::Receiver<String>>,
    task: Option<JoinHandle<SessionExit>>,
}

impl ScanSession {
    /// Start acquiring the camera and scanning
    ///
    /// `detector` is `None` when no decoder is available; the camera is
    /// still opened so its frames can be shown.
    pub fn start(
        manager: CameraBackendManager,
        detector: Option<Arc<dyn Detector>>,
        constraints: StreamConstraints,
    ) -> Self {
        let token = ScanToken::new();
        let (state_tx, state_rx) = watch::channel(SessionState::Starting);
        let (preview_tx, preview_rx) = watch::channel(None);
        let (result_tx, result_rx) = oneshot::channel();

        info!(constraints = %constraints, "Starting scan session");

        let task = tokio::spawn(run_session(
            manager,
            detector,
            constraints,
            token.clone(),
            state_tx,
            preview_tx,
            result_tx,
        ));

        Self {
            token,
            state: state_rx,
            preview: preview_rx,
            detected: Some(result_rx),
            task: Some(task),
        }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Watch state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Live frames, once the camera is open
    pub fn preview(&self) -> Option<FrameSubscription> {
        self.preview.borrow().clone()
    }

    pub fn token(&self) -> ScanToken {
        self.token.clone()
    }

    /// Cancel the scan
    ///
    /// Safe at any point and any number of times; returns `true` only for the
    /// call that actually cancelled. Never waits for a pending acquisition.
    pub fn stop(&self) -> bool {
        let cancelled = self.token.cancel();
        if cancelled {
            debug!("Scan session stop requested");
        }
        cancelled
    }

    /// Wait for the decoded payload
    ///
    /// `None` if the session ended without a detection, or if the payload
    /// was already taken.
    pub async fn detected(&mut self) -> Option<String> {
        self.detected.take()?.await.ok()
    }

    /// Wait for the session task to finish without cancelling it
    pub async fn wait(mut self) -> SessionExit {
        self.join().await
    }

    /// Cancel (if still running) and wait until the camera is released
    pub async fn close(mut self) -> SessionExit {
        self.stop();
        self.join().await
    }

    async fn join(&mut self) -> SessionExit {
        match self.task.take() {
            Some(task) => task.await.unwrap_or_else(|e| {
                warn!(error = %e, "Scan session task failed");
                SessionExit::Failed(CameraError::BackendError(e.to_string()))
            }),
            None => SessionExit::Cancelled,
        }
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run_session(
    manager: CameraBackendManager,
    detector: Option<Arc<dyn Detector>>,
    constraints: StreamConstraints,
    token: ScanToken,
    state: watch::Sender<SessionState>,
    preview: watch::Sender<Option<FrameSubscription>>,
    result: oneshot::Sender<String>,
) -> SessionExit {
    let acquired = tokio::select! {
        biased;
        _ = token.finished() => {
            debug!("Scan cancelled before the camera was acquired");
            return SessionExit::Cancelled;
        }
        acquired = manager.acquire(&constraints) => acquired,
    };

    let stream = match acquired {
        Ok(stream) => stream,
        Err(e) => {
            warn!(error = %e, "Camera acquisition failed");
            state.send_replace(SessionState::Error(e.to_string()));
            token.cancel();
            return SessionExit::Failed(e);
        }
    };

    if !token.is_active() {
        debug!("Camera acquired after cancellation, releasing");
        release(stream).await;
        return SessionExit::Cancelled;
    }

    preview.send_replace(Some(stream.subscribe()));

    let Some(detector) = detector else {
        info!("No QR decoder available, keeping camera open for manual entry");
        state.send_replace(SessionState::NoDetectorAvailable);
        token.finished().await;
        preview.send_replace(None);
        release(stream).await;
        return SessionExit::Cancelled;
    };

    state.send_replace(SessionState::Scanning);
    let exit = DetectionLoop::new(stream.subscribe(), detector, token.clone())
        .run(|payload| {
            let _ = result.send(payload);
        })
        .await;

    preview.send_replace(None);
    release(stream).await;

    match exit {
        LoopExit::Detected => SessionExit::Detected,
        LoopExit::Cancelled => SessionExit::Cancelled,
        LoopExit::SourceEnded => {
            token.cancel();
            SessionExit::StreamEnded
        }
    }
}

/// Stop a stream off the runtime threads; joining the capture thread blocks
async fn release(mut stream: LiveStream) {
    if let Err(e) = tokio::task::spawn_blocking(move || {
        stream.stop();
    })
    .await
    {
        warn!(error = %e, "Failed to release camera stream cleanly");
    }
}

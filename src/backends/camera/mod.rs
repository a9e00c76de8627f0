// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  ScanSession (app)  │
//! └──────────┬──────────┘
//!            │ acquire / stop
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackendManager│  ← Exclusive lease, blocking open offloaded
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  CameraBackend Trait│  ← Common interface
//! └──────────┬──────────┘
//!            │
//!       ┌────┴─────┐
//!       ▼          ▼
//!   ┌──────┐   ┌──────┐
//!   │ V4L2 │   │ File │
//!   └──────┘   └──────┘
//! ```
//!
//! A backend's `open` returns a [`LiveStream`]: the owning handle of one
//! capture thread. Consumers never hold the stream itself, only a
//! [`FrameSubscription`] that yields the newest published frame.

pub mod file_source;
pub mod format_converters;
pub mod frame_loop;
pub mod manager;
pub mod types;
#[cfg(feature = "v4l2")]
pub mod v4l2;

pub use file_source::FileSourceBackend;
pub use frame_loop::{CaptureLoopController, LoopAction};
pub use manager::CameraBackendManager;
pub use types::*;

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, watch};
use tracing::{debug, info};

/// Common interface of camera backends
pub trait CameraBackend: Send + Sync {
    /// Backend identifier
    fn backend_type(&self) -> CameraBackendType;

    /// Check whether this backend can be used on this system
    fn is_available(&self) -> bool;

    /// List the devices this backend can open
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Open a live stream matching `constraints` as closely as possible
    ///
    /// Blocking: device setup happens before this returns. Callers on an
    /// async runtime go through [`CameraBackendManager::acquire`].
    fn open(&self, constraints: &StreamConstraints) -> BackendResult<LiveStream>;
}

/// Create the backend for a backend type
///
/// `device` is a V4L2 device path for [`CameraBackendType::V4l2`] and an image
/// path for [`CameraBackendType::File`].
pub fn get_backend_for_type(backend_type: CameraBackendType, device: &str) -> Arc<dyn CameraBackend> {
    match backend_type {
        CameraBackendType::File => Arc::new(FileSourceBackend::new(device)),
        #[cfg(feature = "v4l2")]
        CameraBackendType::V4l2 => Arc::new(v4l2::V4l2Backend::new(device)),
        #[cfg(not(feature = "v4l2"))]
        CameraBackendType::V4l2 => Arc::new(UnavailableBackend(backend_type)),
    }
}

/// Placeholder for backends compiled out of this build
#[cfg(not(feature = "v4l2"))]
struct UnavailableBackend(CameraBackendType);

#[cfg(not(feature = "v4l2"))]
impl CameraBackend for UnavailableBackend {
    fn backend_type(&self) -> CameraBackendType {
        self.0
    }

    fn is_available(&self) -> bool {
        false
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        Vec::new()
    }

    fn open(&self, _constraints: &StreamConstraints) -> BackendResult<LiveStream> {
        Err(BackendError::NotAvailable(format!(
            "{} support is not compiled into this build",
            self.0
        )))
    }
}

type FrameSlot = Option<Arc<CameraFrame>>;

/// Write side of a stream's frame channel, owned by the capture thread
///
/// Only the newest frame is kept. Publishing `None` (via [`close`](Self::close))
/// tells subscribers the stream has ended.
#[derive(Clone)]
pub struct FramePublisher {
    sender: Arc<watch::Sender<FrameSlot>>,
}

impl Default for FramePublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl FramePublisher {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Replace the current frame
    pub fn publish(&self, frame: CameraFrame) {
        self.sender.send_replace(Some(Arc::new(frame)));
    }

    /// Signal end of stream to all subscribers
    pub fn close(&self) {
        self.sender.send_replace(None);
    }

    /// Subscribe to frames published from now on
    pub fn subscribe(&self) -> FrameSubscription {
        FrameSubscription {
            receiver: self.sender.subscribe(),
        }
    }
}

/// Anything the detection loop can pull frames from
pub trait FrameSource: Send {
    /// Wait for the next frame; `None` once the source has ended
    fn next_frame(&mut self) -> impl Future<Output = Option<Arc<CameraFrame>>> + Send;
}

/// Non-owning view of a live stream's frames
///
/// Frames published while the subscriber is busy are skipped; each call to
/// `next_frame` waits for a frame newer than the last one returned.
#[derive(Clone)]
pub struct FrameSubscription {
    receiver: watch::Receiver<FrameSlot>,
}

impl FrameSource for FrameSubscription {
    async fn next_frame(&mut self) -> Option<Arc<CameraFrame>> {
        if self.receiver.changed().await.is_err() {
            return None;
        }
        self.receiver.borrow_and_update().clone()
    }
}

/// Owning handle of an active camera stream
///
/// Holds the capture thread and, when acquired through the manager, the
/// camera lease. `stop` releases both exactly once; dropping the handle
/// stops it too.
pub struct LiveStream {
    label: String,
    publisher: FramePublisher,
    capture: Option<CaptureLoopController>,
    lease: Option<OwnedSemaphorePermit>,
    stopped: bool,
}

impl LiveStream {
    /// Wrap a running capture loop that publishes into `publisher`
    pub fn new(label: impl Into<String>, publisher: FramePublisher, capture: CaptureLoopController) -> Self {
        let label = label.into();
        info!(stream = %label, "Camera stream started");
        Self {
            label,
            publisher,
            capture: Some(capture),
            lease: None,
            stopped: false,
        }
    }

    /// Attach the manager's exclusive camera lease to this stream
    pub(crate) fn with_lease(mut self, lease: OwnedSemaphorePermit) -> Self {
        self.lease = Some(lease);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn subscribe(&self) -> FrameSubscription {
        self.publisher.subscribe()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Stop capture and release the device
    ///
    /// Returns `true` only for the call that actually released the stream.
    /// Blocks until the capture thread has exited.
    pub fn stop(&mut self) -> bool {
        if self.stopped {
            debug!(stream = %self.label, "Stream already stopped");
            return false;
        }
        self.stopped = true;

        if let Some(mut capture) = self.capture.take() {
            capture.stop();
        }
        self.publisher.close();
        self.lease.take();

        info!(stream = %self.label, "Camera stream stopped");
        true
    }
}

impl Drop for LiveStream {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for LiveStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveStream")
            .field("label", &self.label)
            .field("stopped", &self.stopped)
            .field("leased", &self.lease.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn ticking_stream(ticks: Arc<AtomicU32>) -> LiveStream {
        let publisher = FramePublisher::new();
        let thread_publisher = publisher.clone();
        let capture = CaptureLoopController::start("test-stream", move || {
            ticks.fetch_add(1, Ordering::SeqCst);
            thread_publisher.publish(CameraFrame::from_rgba(1, 1, vec![0, 0, 0, 255]));
            std::thread::sleep(Duration::from_millis(2));
            LoopAction::Continue
        });
        LiveStream::new("test", publisher, capture)
    }

    #[tokio::test]
    async fn test_subscription_receives_frames() {
        let stream = ticking_stream(Arc::new(AtomicU32::new(0)));
        let mut frames = stream.subscribe();
        let frame = frames.next_frame().await.unwrap();
        assert_eq!((frame.width, frame.height), (1, 1));
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_and_ends_subscriptions() {
        let ticks = Arc::new(AtomicU32::new(0));
        let mut stream = ticking_stream(Arc::clone(&ticks));
        let mut frames = stream.subscribe();

        assert!(stream.stop());
        assert!(!stream.stop());
        assert!(stream.is_stopped());

        let after = ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), after);
        assert!(frames.next_frame().await.is_none());
    }

    #[test]
    fn test_missing_backend_reports_not_available() {
        #[cfg(not(feature = "v4l2"))]
        {
            let backend = get_backend_for_type(CameraBackendType::V4l2, "/dev/video0");
            assert!(!backend.is_available());
            assert!(matches!(
                backend.open(&StreamConstraints::default()),
                Err(BackendError::NotAvailable(_))
            ));
        }
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend lifecycle manager
//!
//! The manager provides:
//! - Exclusive camera access (one live stream at a time)
//! - Async acquisition with the blocking device open offloaded

use super::types::*;
use super::{CameraBackend, LiveStream, get_backend_for_type};
use crate::errors::CameraError;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Camera backend manager
///
/// Cloning shares the backend and the lease, so every clone sees the same
/// camera as busy while a stream is alive.
#[derive(Clone)]
pub struct CameraBackendManager {
    backend: Arc<dyn CameraBackend>,
    lease: Arc<Semaphore>,
}

impl CameraBackendManager {
    /// Create a manager for a backend type
    ///
    /// # Arguments
    /// * `backend_type` - The type of backend to use
    /// * `device` - Device node (V4L2) or image path (file source)
    pub fn new(backend_type: CameraBackendType, device: &str) -> Self {
        info!(backend = %backend_type, device, "Creating camera backend manager");
        Self::with_backend(get_backend_for_type(backend_type, device))
    }

    /// Create a manager around an existing backend
    pub fn with_backend(backend: Arc<dyn CameraBackend>) -> Self {
        Self {
            backend,
            lease: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn backend_type(&self) -> CameraBackendType {
        self.backend.backend_type()
    }

    /// Check if the backend is available on this system
    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    /// Enumerate available cameras
    pub fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>> {
        let cameras = self.backend.enumerate_cameras();
        if cameras.is_empty() {
            Err(BackendError::DeviceNotFound("No cameras found".to_string()))
        } else {
            Ok(cameras)
        }
    }

    /// Whether a live stream currently holds the camera
    pub fn is_in_use(&self) -> bool {
        self.lease.available_permits() == 0
    }

    /// Open a stream, waiting until any previous stream has been released
    ///
    /// Dropping the returned future before it resolves is safe: a stream
    /// opened after that point is stopped as soon as the open completes.
    pub async fn acquire(&self, constraints: &StreamConstraints) -> Result<LiveStream, CameraError> {
        if self.is_in_use() {
            debug!("Camera in use, waiting for release");
        }
        let permit = Arc::clone(&self.lease)
            .acquire_owned()
            .await
            .map_err(|_| CameraError::Busy)?;

        info!(constraints = %constraints, backend = %self.backend_type(), "Acquiring camera");

        let backend = Arc::clone(&self.backend);
        let constraints = constraints.clone();
        let opened = tokio::task::spawn_blocking(move || {
            backend
                .open(&constraints)
                .map(|stream| stream.with_lease(permit))
        })
        .await
        .map_err(|e| CameraError::InitializationFailed(format!("Camera open task failed: {}", e)))?;

        opened.map_err(CameraError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::{CaptureLoopController, FramePublisher, LoopAction};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct CountingBackend {
        opened: AtomicU32,
    }

    impl CameraBackend for CountingBackend {
        fn backend_type(&self) -> CameraBackendType {
            CameraBackendType::File
        }

        fn is_available(&self) -> bool {
            true
        }

        fn enumerate_cameras(&self) -> Vec<CameraDevice> {
            Vec::new()
        }

        fn open(&self, _constraints: &StreamConstraints) -> BackendResult<LiveStream> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            let publisher = FramePublisher::new();
            let capture = CaptureLoopController::start("counting", || {
                std::thread::sleep(Duration::from_millis(1));
                LoopAction::Continue
            });
            Ok(LiveStream::new("counting", publisher, capture))
        }
    }

    #[tokio::test]
    async fn test_second_acquire_waits_for_release() {
        let backend = Arc::new(CountingBackend {
            opened: AtomicU32::new(0),
        });
        let manager = CameraBackendManager::with_backend(backend.clone());
        let constraints = StreamConstraints::default();

        let mut first = manager.acquire(&constraints).await.unwrap();
        assert!(manager.is_in_use());

        let waiting = tokio::time::timeout(Duration::from_millis(50), manager.acquire(&constraints)).await;
        assert!(waiting.is_err());
        assert_eq!(backend.opened.load(Ordering::SeqCst), 1);

        first.stop();
        assert!(!manager.is_in_use());

        let second = manager.acquire(&constraints).await.unwrap();
        assert_eq!(backend.opened.load(Ordering::SeqCst), 2);
        drop(second);
        assert!(!manager.is_in_use());
    }

    #[test]
    fn test_empty_enumeration_is_an_error() {
        let manager = CameraBackendManager::with_backend(Arc::new(CountingBackend {
            opened: AtomicU32::new(0),
        }));
        assert!(matches!(
            manager.enumerate_cameras(),
            Err(BackendError::DeviceNotFound(_))
        ));
    }
}

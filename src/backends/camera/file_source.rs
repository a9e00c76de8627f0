// SPDX-License-Identifier: GPL-3.0-only

//! Still image replayed as a live camera stream
//!
//! Lets the scanner run against a saved photo of a label, on machines with
//! no camera, and in tests. The image is decoded once when the stream opens
//! and republished at a fixed interval with fresh timestamps.

use super::frame_loop::{CaptureLoopController, LoopAction};
use super::types::*;
use super::{CameraBackend, FramePublisher, LiveStream};
use crate::constants;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Backend that streams a single image file
pub struct FileSourceBackend {
    path: PathBuf,
    frame_interval: Duration,
}

impl FileSourceBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            frame_interval: constants::camera::FILE_SOURCE_FRAME_INTERVAL,
        }
    }

    /// Override the republish interval
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CameraBackend for FileSourceBackend {
    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::File
    }

    fn is_available(&self) -> bool {
        self.path.is_file()
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        if !self.is_available() {
            return Vec::new();
        }
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        vec![CameraDevice {
            name,
            path: self.path.display().to_string(),
            facing: None,
        }]
    }

    fn open(&self, constraints: &StreamConstraints) -> BackendResult<LiveStream> {
        if constraints.facing == FacingMode::User {
            warn!("File source has no facing; ignoring 'user' preference");
        }

        let frame = load_image_as_frame(&self.path)?;
        let publisher = FramePublisher::new();
        let thread_publisher = publisher.clone();
        let interval = self.frame_interval;

        let capture = CaptureLoopController::start("file-source", move || {
            thread_publisher.publish(frame.restamped());
            std::thread::sleep(interval);
            LoopAction::Continue
        });

        Ok(LiveStream::new(
            format!("file:{}", self.path.display()),
            publisher,
            capture,
        ))
    }
}

/// Decode an image file into an RGBA frame
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    info!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(io) => BackendError::from(io),
        other => BackendError::InitializationFailed(format!(
            "Failed to load image '{}': {}",
            path.display(),
            other
        )),
    })?;

    let rgba = img.to_rgba8();
    let width = rgba.width();
    let height = rgba.height();
    if width == 0 || height == 0 {
        return Err(BackendError::InitializationFailed(format!(
            "Image '{}' is empty",
            path.display()
        )));
    }

    info!(width, height, "Image loaded successfully");
    Ok(CameraFrame::from_rgba(width, height, rgba.into_raw()))
}

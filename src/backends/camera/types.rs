// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Camera backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CameraBackendType {
    /// Native V4L2 capture (requires the `v4l2` feature)
    #[default]
    V4l2,
    /// Still image replayed as a live stream
    File,
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::V4l2 => write!(f, "V4L2"),
            CameraBackendType::File => write!(f, "file"),
        }
    }
}

/// Which way the camera should face relative to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front camera (selfie)
    User,
    /// Rear camera, pointing away from the user
    #[default]
    Environment,
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacingMode::User => write!(f, "user"),
            FacingMode::Environment => write!(f, "environment"),
        }
    }
}

/// Constraints passed to a backend when requesting a stream
///
/// Width and height are hints. Backends pick the closest mode they support
/// and report the real frame size on each [`CameraFrame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConstraints {
    pub facing: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            ideal_width: crate::constants::camera::IDEAL_WIDTH,
            ideal_height: crate::constants::camera::IDEAL_HEIGHT,
        }
    }
}

impl std::fmt::Display for StreamConstraints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} ({})",
            self.ideal_width, self.ideal_height, self.facing
        )
    }
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    pub path: String,
    pub facing: Option<FacingMode>,
}

/// Pixel format for camera frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    RGBA,
    /// Gray8 - 8-bit grayscale (single channel)
    Gray8,
}

impl PixelFormat {
    /// Bytes per pixel
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            Self::RGBA => 4,
            Self::Gray8 => 1,
        }
    }
}

/// A single decoded frame from a live stream
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    pub format: PixelFormat,
    /// Bytes per row, may include padding
    pub stride: u32,
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a tightly packed RGBA frame
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            format: PixelFormat::RGBA,
            stride: width * 4,
            captured_at: Instant::now(),
        }
    }

    /// Copy of this frame with a fresh capture timestamp, sharing pixel data
    pub fn restamped(&self) -> Self {
        Self {
            captured_at: Instant::now(),
            data: Arc::clone(&self.data),
            ..*self
        }
    }

    /// Check that the buffer is large enough for the declared geometry
    pub fn is_well_formed(&self) -> bool {
        if self.width == 0 || self.height == 0 {
            return false;
        }
        let row = self.width as usize * self.format.bytes_per_pixel() as usize;
        if (self.stride as usize) < row {
            return false;
        }
        let needed = self.stride as usize * (self.height as usize - 1) + row;
        self.data.len() >= needed
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors reported by camera backends
#[derive(Debug, Clone)]
pub enum BackendError {
    /// Backend cannot be used on this system
    NotAvailable(String),
    /// Access to the device was refused
    PermissionDenied(String),
    /// Device could not be opened or configured
    InitializationFailed(String),
    /// No device matches the request
    DeviceNotFound(String),
    /// Requested format is not supported
    FormatNotSupported(String),
    /// I/O error
    IoError(String),
    /// Generic error
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<String> for BackendError {
    fn from(msg: String) -> Self {
        BackendError::Other(msg)
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => BackendError::PermissionDenied(err.to_string()),
            std::io::ErrorKind::NotFound => BackendError::DeviceNotFound(err.to_string()),
            _ => BackendError::IoError(err.to_string()),
        }
    }
}

// SPDX-License-Identifier: MPL-2.0

//! Error types for the inventory application

use crate::backends::camera::BackendError;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera-related errors
    Camera(CameraError),
    /// Photo compression errors
    Photo(PhotoError),
    /// Database / object storage errors
    Store(StoreError),
    /// Configuration errors
    Config(String),
    /// Generic error with message
    Other(String),
}

/// Camera acquisition errors
///
/// Any of these is terminal for the scan session that hit it.
#[derive(Debug, Clone)]
pub enum CameraError {
    /// The user or the system refused camera access
    PermissionDenied(String),
    /// No camera devices found
    NoCameraFound(String),
    /// Camera initialization failed
    InitializationFailed(String),
    /// Backend error (e.g., not compiled in)
    BackendError(String),
    /// Camera is held by another session
    Busy,
}

/// Photo compression errors
#[derive(Debug, Clone)]
pub enum PhotoError {
    /// Source bytes are not a decodable image
    DecodeFailed(String),
    /// Source decoded to an image with no pixels
    EmptyImage,
    /// Encoding failed
    EncodingFailed(String),
    /// Data URL could not be parsed
    InvalidDataUrl(String),
}

/// Persistence and object storage errors
#[derive(Debug, Clone)]
pub enum StoreError {
    /// Transport failure talking to the backend
    Http(String),
    /// Backend answered with an error status
    Status { status: u16, message: String },
    /// Response body did not match the expected shape
    InvalidResponse(String),
    /// Record does not exist
    NotFound(String),
    /// Object already exists at the upload path
    Conflict(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Photo(e) => write!(f, "Photo error: {}", e),
            AppError::Store(e) => write!(f, "Storage error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::PermissionDenied(msg) => write!(f, "Camera access denied: {}", msg),
            CameraError::NoCameraFound(msg) => write!(f, "No camera found: {}", msg),
            CameraError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            CameraError::BackendError(msg) => write!(f, "Backend error: {}", msg),
            CameraError::Busy => write!(f, "Camera is busy"),
        }
    }
}

impl fmt::Display for PhotoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoError::DecodeFailed(msg) => write!(f, "Could not decode image: {}", msg),
            PhotoError::EmptyImage => write!(f, "Image has no pixels"),
            PhotoError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            PhotoError::InvalidDataUrl(msg) => write!(f, "Invalid data URL: {}", msg),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Http(msg) => write!(f, "Request failed: {}", msg),
            StoreError::Status { status, message } => {
                write!(f, "Backend returned {}: {}", status, message)
            }
            StoreError::InvalidResponse(msg) => write!(f, "Unexpected response: {}", msg),
            StoreError::NotFound(what) => write!(f, "Not found: {}", what),
            StoreError::Conflict(what) => write!(f, "Already exists: {}", what),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for PhotoError {}
impl std::error::Error for StoreError {}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<PhotoError> for AppError {
    fn from(err: PhotoError) -> Self {
        AppError::Photo(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<BackendError> for CameraError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::PermissionDenied(msg) => CameraError::PermissionDenied(msg),
            BackendError::DeviceNotFound(msg) => CameraError::NoCameraFound(msg),
            BackendError::InitializationFailed(msg) | BackendError::FormatNotSupported(msg) => {
                CameraError::InitializationFailed(msg)
            }
            other => CameraError::BackendError(other.to_string()),
        }
    }
}

impl From<image::ImageError> for PhotoError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Encoding(e) => PhotoError::EncodingFailed(e.to_string()),
            other => PhotoError::DecodeFailed(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::InvalidResponse(err.to_string())
        } else {
            StoreError::Http(err.to_string())
        }
    }
}

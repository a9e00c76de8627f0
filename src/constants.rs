// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Photo compression defaults
pub mod photo {
    /// Longest edge of a compressed item photo, in pixels
    pub const MAX_DIMENSION: u32 = 600;
    /// Encoder quality on a 0.0 - 1.0 scale
    pub const QUALITY: f32 = 0.7;
    /// MIME type of compressed photos
    pub const MIME_TYPE: &str = "image/jpeg";
    /// File extension used for uploaded photos
    pub const EXTENSION: &str = "jpg";
}

/// Camera request defaults
pub mod camera {
    use std::time::Duration;

    /// Ideal capture width requested from the camera
    pub const IDEAL_WIDTH: u32 = 640;
    /// Ideal capture height requested from the camera
    pub const IDEAL_HEIGHT: u32 = 480;
    /// Frame interval used when replaying a still image as a stream
    pub const FILE_SOURCE_FRAME_INTERVAL: Duration = Duration::from_millis(33);
    /// Number of mmap buffers requested from V4L2 devices
    pub const V4L2_BUFFER_COUNT: u32 = 4;
    /// Default V4L2 device
    pub const DEFAULT_DEVICE: &str = "/dev/video0";
}

/// QR code detection and rendering
pub mod qr {
    /// Frames are downscaled to this size before decoding
    pub const DETECT_MAX_DIMENSION: u32 = 640;
    /// Public QR image generation endpoint
    pub const RENDER_ENDPOINT: &str = "https://api.qrserver.com/v1/create-qr-code/";
    /// Background colour of rendered QR images (hex, no leading #)
    pub const RENDER_BACKGROUND: &str = "1E293B";
    /// Foreground colour of rendered QR images (hex, no leading #)
    pub const RENDER_FOREGROUND: &str = "E2E8F0";
    /// On-screen QR size in pixels
    pub const DISPLAY_SIZE: u32 = 250;
    /// Downloadable QR size in pixels
    pub const DOWNLOAD_SIZE: u32 = 400;
    /// Query parameter carrying the box identifier in a locator URL
    pub const BOX_PARAM: &str = "box";
}

/// Managed backend defaults
pub mod backend {
    use std::time::Duration;

    /// Object storage bucket for item photos
    pub const PHOTO_BUCKET: &str = "item-photos";
    /// Table holding boxes
    pub const BOXES_TABLE: &str = "boxes";
    /// Table holding items
    pub const ITEMS_TABLE: &str = "items";
    /// Request timeout
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    /// Connect timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
}

/// How long a toast notification stays visible
pub const TOAST_DURATION: Duration = Duration::from_millis(2500);

/// Colour palette assigned to boxes
pub const BOX_COLORS: [&str; 10] = [
    "#3B82F6", "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#EC4899", "#06B6D4", "#84CC16",
    "#F97316", "#6366F1",
];

/// Colour used for boxes that have none set
pub const DEFAULT_BOX_COLOR: &str = BOX_COLORS[0];

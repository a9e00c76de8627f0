// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection task
//!
//! This module implements QR code detection using the rqrr crate.
//! It converts camera frames to a downscaled luma plane and searches for QR
//! codes, returning their positions and decoded content.

use crate::app::frame_processor::types::{FrameRegion, QrDetection};
use crate::backends::camera::types::CameraFrame;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// Outcome of one detection attempt
pub type DetectResult = Result<Vec<QrDetection>, DetectError>;

/// Per-frame detection failure
///
/// Always transient: the scan loop logs it and moves on to the next frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectError {
    /// Frame buffer does not match its declared geometry
    MalformedFrame,
    /// Codes were located but none could be decoded
    Decode(String),
    /// The blocking detection task did not complete
    TaskFailed(String),
}

impl fmt::Display for DetectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectError::MalformedFrame => write!(f, "Malformed frame"),
            DetectError::Decode(msg) => write!(f, "QR decode failed: {}", msg),
            DetectError::TaskFailed(msg) => write!(f, "Detection task failed: {}", msg),
        }
    }
}

impl std::error::Error for DetectError {}

/// Something that finds QR payloads in a frame
///
/// Results are returned in a stable order; the scan loop takes the first.
pub trait Detector: Send + Sync {
    fn detect(&self, frame: Arc<CameraFrame>) -> BoxFuture<'_, DetectResult>;
}

/// The detector compiled into this build, if any
pub fn default_detector() -> Option<Arc<dyn Detector>> {
    #[cfg(feature = "qr-detect")]
    {
        Some(Arc::new(QrDetector::new()))
    }
    #[cfg(not(feature = "qr-detect"))]
    {
        None
    }
}

#[cfg(feature = "qr-detect")]
pub use rqrr_detector::QrDetector;

#[cfg(feature = "qr-detect")]
mod rqrr_detector {
    use super::*;
    use crate::backends::camera::format_converters::{frame_to_luma, luma_at};
    use crate::constants;
    use tracing::{debug, trace};

    /// QR code detector
    ///
    /// Analyzes camera frames to detect and decode QR codes.
    /// Optimized for real-time processing with frame downscaling.
    pub struct QrDetector {
        /// Maximum dimension for processing (frames are downscaled to this)
        max_dimension: u32,
    }

    impl Default for QrDetector {
        fn default() -> Self {
            Self::new()
        }
    }

    impl QrDetector {
        pub fn new() -> Self {
            Self {
                max_dimension: constants::qr::DETECT_MAX_DIMENSION,
            }
        }

        /// Create a QR detector with custom max dimension
        pub fn with_max_dimension(max_dimension: u32) -> Self {
            Self {
                max_dimension: max_dimension.max(1),
            }
        }
    }

    impl Detector for QrDetector {
        fn detect(&self, frame: Arc<CameraFrame>) -> BoxFuture<'_, DetectResult> {
            let max_dim = self.max_dimension;
            Box::pin(async move {
                // Decoding is CPU bound; keep it off the runtime threads
                tokio::task::spawn_blocking(move || detect_sync(&frame, max_dim))
                    .await
                    .map_err(|e| DetectError::TaskFailed(e.to_string()))?
            })
        }
    }

    /// Synchronous QR detection (runs in blocking task)
    pub(super) fn detect_sync(frame: &CameraFrame, max_dimension: u32) -> DetectResult {
        if !frame.is_well_formed() {
            return Err(DetectError::MalformedFrame);
        }
        let start = std::time::Instant::now();

        let (width, height) = (frame.width, frame.height);
        let scale = (width as f32 / max_dimension as f32)
            .max(height as f32 / max_dimension as f32)
            .max(1.0);
        let proc_width = ((width as f32 / scale) as u32).max(1);
        let proc_height = ((height as f32 / scale) as u32).max(1);

        let luma = if proc_width == width && proc_height == height {
            frame_to_luma(frame)
        } else {
            downscale_luma(frame, proc_width, proc_height)
        };
        trace!(
            proc_width,
            proc_height,
            scale,
            conversion_ms = start.elapsed().as_millis(),
            "Prepared luma plane for processing"
        );

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            proc_width as usize,
            proc_height as usize,
            |x, y| luma[y * proc_width as usize + x],
        );
        let grids = prepared.detect_grids();
        if grids.is_empty() {
            return Ok(Vec::new());
        }

        let mut detections = Vec::with_capacity(grids.len());
        let mut last_error = None;

        for grid in &grids {
            let content = match grid.decode() {
                Ok((_meta, content)) => content,
                Err(e) => {
                    debug!(error = ?e, "Failed to decode QR code");
                    last_error = Some(format!("{:?}", e));
                    continue;
                }
            };

            let xs = grid.bounds.iter().map(|p| p.x);
            let ys = grid.bounds.iter().map(|p| p.y);
            let min_x = xs.clone().min().unwrap_or(0).max(0) as f32 * scale;
            let max_x = xs.max().unwrap_or(0).max(0) as f32 * scale;
            let min_y = ys.clone().min().unwrap_or(0).max(0) as f32 * scale;
            let max_y = ys.max().unwrap_or(0).max(0) as f32 * scale;

            let region = FrameRegion::from_pixels(
                min_x as u32,
                min_y as u32,
                (max_x - min_x) as u32,
                (max_y - min_y) as u32,
                width,
                height,
            );

            debug!(
                content = %content,
                x = region.x,
                y = region.y,
                "Detected QR code"
            );
            detections.push(QrDetection::new(region, content));
        }

        match (detections.is_empty(), last_error) {
            (true, Some(e)) => Err(DetectError::Decode(e)),
            _ => {
                debug!(
                    count = detections.len(),
                    total_ms = start.elapsed().as_millis(),
                    "QR detection complete"
                );
                Ok(detections)
            }
        }
    }

    /// Downscale a frame's luma using bilinear interpolation
    pub(super) fn downscale_luma(frame: &CameraFrame, dst_width: u32, dst_height: u32) -> Vec<u8> {
        let src_width = frame.width as usize;
        let src_height = frame.height as usize;
        let mut result = Vec::with_capacity((dst_width * dst_height) as usize);

        let x_ratio = src_width as f32 / dst_width as f32;
        let y_ratio = src_height as f32 / dst_height as f32;

        for y in 0..dst_height {
            for x in 0..dst_width {
                let src_x = x as f32 * x_ratio;
                let src_y = y as f32 * y_ratio;

                let x0 = (src_x as usize).min(src_width - 1);
                let y0 = (src_y as usize).min(src_height - 1);
                let x1 = (x0 + 1).min(src_width - 1);
                let y1 = (y0 + 1).min(src_height - 1);

                let x_frac = src_x - x0 as f32;
                let y_frac = src_y - y0 as f32;

                let p = |px, py| luma_at(frame, px, py) as f32;
                let value = p(x0, y0) * (1.0 - x_frac) * (1.0 - y_frac)
                    + p(x1, y0) * x_frac * (1.0 - y_frac)
                    + p(x0, y1) * (1.0 - x_frac) * y_frac
                    + p(x1, y1) * x_frac * y_frac;

                result.push(value as u8);
            }
        }

        result
    }
}

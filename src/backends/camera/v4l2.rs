// SPDX-License-Identifier: GPL-3.0-only

//! Native V4L2 camera backend
//!
//! Opens a `/dev/video*` node, negotiates YUYV (or MJPEG when the driver
//! insists) close to the requested size and streams through memory-mapped
//! buffers. Frames are converted to RGBA on the capture thread.

use super::format_converters::yuyv_to_rgba;
use super::frame_loop::{CaptureLoopController, LoopAction};
use super::types::*;
use super::{CameraBackend, FramePublisher, LiveStream};
use crate::constants;
use std::path::Path;
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};
use tracing::{debug, info, warn};

/// V4L2 backend bound to one device node
pub struct V4l2Backend {
    device_path: String,
}

impl V4l2Backend {
    pub fn new(device_path: impl Into<String>) -> Self {
        Self {
            device_path: device_path.into(),
        }
    }
}

impl CameraBackend for V4l2Backend {
    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::V4l2
    }

    fn is_available(&self) -> bool {
        Path::new(&self.device_path).exists()
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        v4l::context::enum_devices()
            .into_iter()
            .map(|node| {
                let path = node.path().display().to_string();
                CameraDevice {
                    name: node.name().unwrap_or_else(|| path.clone()),
                    path,
                    facing: None,
                }
            })
            .collect()
    }

    fn open(&self, constraints: &StreamConstraints) -> BackendResult<LiveStream> {
        if constraints.facing == FacingMode::User {
            // V4L2 exposes no facing metadata; the configured node is used as is
            debug!("Facing preference not supported by V4L2, using configured device");
        }

        let publisher = FramePublisher::new();
        let thread_publisher = publisher.clone();
        let path = self.device_path.clone();
        let (width, height) = (constraints.ideal_width, constraints.ideal_height);

        let capture = CaptureLoopController::spawn_with_init(
            "v4l2-capture",
            move || V4l2Capture::open(&path, width, height),
            move |capture| {
                match capture.next_frame() {
                    Ok(Some(frame)) => thread_publisher.publish(frame),
                    Ok(None) => {}
                    Err(e) => {
                        warn!(error = %e, "V4L2 capture failed, ending stream");
                        thread_publisher.close();
                        return LoopAction::Stop;
                    }
                }
                LoopAction::Continue
            },
        )?;

        Ok(LiveStream::new(
            format!("v4l2:{}", self.device_path),
            publisher,
            capture,
        ))
    }
}

/// Device state owned by the capture thread
struct V4l2Capture {
    stream: MmapStream<'static>,
    format: Format,
    consecutive_errors: u32,
    _device: Device,
}

impl V4l2Capture {
    const MAX_CONSECUTIVE_ERRORS: u32 = 30;

    fn open(path: &str, width: u32, height: u32) -> BackendResult<Self> {
        info!(path, width, height, "Opening V4L2 device");

        let device = Device::with_path(path)?;

        let yuyv = FourCC::new(b"YUYV");
        let mjpg = FourCC::new(b"MJPG");

        let format = match device.set_format(&Format::new(width, height, yuyv)) {
            Ok(f) if f.fourcc == yuyv || f.fourcc == mjpg => f,
            _ => device
                .set_format(&Format::new(width, height, mjpg))
                .map_err(|e| BackendError::FormatNotSupported(format!("{}: {}", path, e)))?,
        };
        if format.fourcc != yuyv && format.fourcc != mjpg {
            return Err(BackendError::FormatNotSupported(format!(
                "{} only offers {}",
                path, format.fourcc
            )));
        }

        info!(
            width = format.width,
            height = format.height,
            fourcc = %format.fourcc,
            "V4L2 format configured"
        );

        let stream = MmapStream::with_buffers(
            &device,
            Type::VideoCapture,
            constants::camera::V4L2_BUFFER_COUNT,
        )
        .map_err(|e| BackendError::InitializationFailed(format!("Failed to create stream: {}", e)))?;

        Ok(Self {
            stream,
            format,
            consecutive_errors: 0,
            _device: device,
        })
    }

    /// Dequeue and convert one frame; `Ok(None)` for a skipped buffer
    fn next_frame(&mut self) -> BackendResult<Option<CameraFrame>> {
        let buf = match self.stream.next() {
            Ok((buf, _meta)) => buf,
            Err(e) => {
                self.consecutive_errors += 1;
                if self.consecutive_errors >= Self::MAX_CONSECUTIVE_ERRORS {
                    return Err(BackendError::from(e));
                }
                warn!(error = %e, "Failed to dequeue V4L2 buffer");
                return Ok(None);
            }
        };
        self.consecutive_errors = 0;

        let (width, height) = (self.format.width, self.format.height);
        if width == 0 || height == 0 {
            return Ok(None);
        }
        if self.format.fourcc == FourCC::new(b"MJPG") {
            return match image::load_from_memory_with_format(buf, image::ImageFormat::Jpeg) {
                Ok(img) => {
                    let rgba = img.to_rgba8();
                    Ok(Some(CameraFrame::from_rgba(rgba.width(), rgba.height(), rgba.into_raw())))
                }
                Err(e) => {
                    debug!(error = %e, "Dropping undecodable MJPEG frame");
                    Ok(None)
                }
            };
        }

        let row_bytes = width as usize * 2;
        let stride = (self.format.stride as usize).max(row_bytes);
        if buf.len() < stride * (height as usize - 1) + row_bytes {
            debug!(len = buf.len(), "Dropping short YUYV buffer");
            return Ok(None);
        }

        let packed: Vec<u8> = if stride == row_bytes {
            buf[..row_bytes * height as usize].to_vec()
        } else {
            buf.chunks(stride)
                .take(height as usize)
                .flat_map(|row| &row[..row_bytes])
                .copied()
                .collect()
        };
        Ok(Some(CameraFrame::from_rgba(
            width,
            height,
            yuyv_to_rgba(&packed, width, height),
        )))
    }
}

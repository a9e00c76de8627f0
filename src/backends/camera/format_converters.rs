// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion for captured frames
//!
//! Camera backends hand frames to the rest of the app as RGBA; the QR
//! detector only needs luminance, so both directions live here.

use super::types::{CameraFrame, PixelFormat};

/// Convert YUYV (YUV 4:2:2) to RGBA
///
/// YUYV format: Y0 U0 Y1 V0 - each 4-byte group encodes 2 pixels.
/// Uses BT.601 coefficients for YUV to RGB conversion.
pub fn yuyv_to_rgba(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut rgba = Vec::with_capacity(pixel_count * 4);

    for chunk in data.chunks_exact(4) {
        let y0 = chunk[0] as f32;
        let u = chunk[1] as f32 - 128.0;
        let y1 = chunk[2] as f32;
        let v = chunk[3] as f32 - 128.0;

        for y in [y0, y1] {
            if rgba.len() >= pixel_count * 4 {
                break;
            }
            rgba.push((y + 1.402 * v).clamp(0.0, 255.0) as u8);
            rgba.push((y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8);
            rgba.push((y + 1.772 * u).clamp(0.0, 255.0) as u8);
            rgba.push(255);
        }
    }

    rgba
}

/// BT.601 luma of one RGB pixel
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000) as u8
}

/// Read the luma of pixel (x, y), honouring stride
///
/// Out-of-bounds reads return 0 so a short buffer degrades instead of panicking.
#[inline]
pub fn luma_at(frame: &CameraFrame, x: usize, y: usize) -> u8 {
    let stride = frame.stride as usize;
    match frame.format {
        PixelFormat::Gray8 => frame.data.get(y * stride + x).copied().unwrap_or(0),
        PixelFormat::RGBA => {
            let offset = y * stride + x * 4;
            match frame.data.get(offset..offset + 3) {
                Some(px) => luma(px[0], px[1], px[2]),
                None => 0,
            }
        }
    }
}

/// Extract a tightly packed luma plane from a frame
pub fn frame_to_luma(frame: &CameraFrame) -> Vec<u8> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let mut plane = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            plane.push(luma_at(frame, x, y));
        }
    }
    plane
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn test_yuyv_grey_roundtrip() {
        // Neutral chroma: Y passes straight through to R, G and B
        let data = [100u8, 128, 200, 128];
        let rgba = yuyv_to_rgba(&data, 2, 1);
        assert_eq!(rgba, vec![100, 100, 100, 255, 200, 200, 200, 255]);
    }

    #[test]
    fn test_luma_of_primaries() {
        assert_eq!(luma(255, 255, 255), 255);
        assert_eq!(luma(0, 0, 0), 0);
        assert!(luma(0, 255, 0) > luma(255, 0, 0));
        assert!(luma(255, 0, 0) > luma(0, 0, 255));
    }

    #[test]
    fn test_frame_to_luma_skips_stride_padding() {
        let data: Vec<u8> = vec![
            255, 255, 255, 255, 0, 0, 0, 255, 9, 9, // row 0 + padding
            0, 0, 0, 255, 255, 255, 255, 255, 9, 9, // row 1 + padding
        ];
        let frame = CameraFrame {
            width: 2,
            height: 2,
            data: Arc::from(data.as_slice()),
            format: PixelFormat::RGBA,
            stride: 10,
            captured_at: Instant::now(),
        };
        assert_eq!(frame_to_luma(&frame), vec![255, 0, 0, 255]);
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Async photo compression pipeline
//!
//! Item photos are shrunk before upload:
//! - decode any format the `image` crate understands
//! - downscale so the longer side fits `max_dimension` (never upscale)
//! - re-encode as JPEG at the configured quality
//!
//! The CPU-heavy work runs on the blocking pool.

use crate::constants;
use crate::errors::PhotoError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Compression settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressOptions {
    max_dimension: u32,
    quality: f32,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self::new(constants::photo::MAX_DIMENSION, constants::photo::QUALITY)
    }
}

impl CompressOptions {
    /// Build options; `quality` is clamped to 0.0 - 1.0 and `max_dimension`
    /// to at least 1
    pub fn new(max_dimension: u32, quality: f32) -> Self {
        let quality = if quality.is_finite() {
            quality.clamp(0.0, 1.0)
        } else {
            constants::photo::QUALITY
        };
        Self {
            max_dimension: max_dimension.max(1),
            quality,
        }
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    /// Quality on the encoder's 1 - 100 scale
    pub fn jpeg_quality(&self) -> u8 {
        ((self.quality * 100.0).round() as u8).clamp(1, 100)
    }

    /// Scale factor for a source size: min(max/w, max/h, 1)
    pub fn scale_ratio(&self, width: u32, height: u32) -> f64 {
        if width == 0 || height == 0 {
            return 1.0;
        }
        let max = self.max_dimension as f64;
        (max / width as f64).min(max / height as f64).min(1.0)
    }

    /// Output size for a source size; each side at least 1
    pub fn scaled_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let ratio = self.scale_ratio(width, height);
        if ratio >= 1.0 {
            return (width, height);
        }
        let scale = |side: u32| ((side as f64 * ratio).round() as u32).max(1);
        (scale(width), scale(height))
    }
}

/// A compressed photo, ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedImage {
    pub data: Vec<u8>,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
}

impl CompressedImage {
    /// `data:<mime>;base64,<payload>`
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }

    /// Parse a base64 data URL back into bytes
    ///
    /// Dimensions are read from the decoded image header.
    pub fn from_data_url(url: &str) -> Result<Self, PhotoError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| PhotoError::InvalidDataUrl("missing 'data:' prefix".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| PhotoError::InvalidDataUrl("missing ',' separator".to_string()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| PhotoError::InvalidDataUrl("only base64 payloads are supported".to_string()))?;
        if mime_type.is_empty() {
            return Err(PhotoError::InvalidDataUrl("missing MIME type".to_string()));
        }

        let data = STANDARD
            .decode(payload.trim())
            .map_err(|e| PhotoError::InvalidDataUrl(e.to_string()))?;
        let (width, height) = image::ImageReader::new(std::io::Cursor::new(&data))
            .with_guessed_format()
            .map_err(|e| PhotoError::DecodeFailed(e.to_string()))?
            .into_dimensions()?;

        Ok(Self {
            data,
            mime_type: mime_type.to_string(),
            width,
            height,
        })
    }

    /// Size of the encoded data in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Decode, downscale and re-encode an image
pub fn compress_image(bytes: &[u8], options: &CompressOptions) -> Result<CompressedImage, PhotoError> {
    let start = std::time::Instant::now();

    let decoded = image::load_from_memory(bytes)?;
    let (src_width, src_height) = (decoded.width(), decoded.height());
    if src_width == 0 || src_height == 0 {
        return Err(PhotoError::EmptyImage);
    }

    let (width, height) = options.scaled_dimensions(src_width, src_height);
    let resized = if (width, height) == (src_width, src_height) {
        decoded
    } else {
        decoded.resize_exact(width, height, FilterType::Triangle)
    };

    let data = encode_jpeg(flatten_to_rgb(resized), options.jpeg_quality())?;

    debug!(
        src_width,
        src_height,
        width,
        height,
        size = data.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "Compressed photo"
    );

    Ok(CompressedImage {
        data,
        mime_type: constants::photo::MIME_TYPE.to_string(),
        width,
        height,
    })
}

/// Drop alpha the way a browser canvas export does: composite over black
fn flatten_to_rgb(image: DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.into_rgb8();
    }
    let rgba = image.into_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (dst, src) in rgb.pixels_mut().zip(rgba.pixels()) {
        let a = src[3] as u16;
        for c in 0..3 {
            dst[c] = ((src[c] as u16 * a + 127) / 255) as u8;
        }
    }
    rgb
}

/// Encode image as JPEG
fn encode_jpeg(image: RgbImage, quality: u8) -> Result<Vec<u8>, PhotoError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);

    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| PhotoError::EncodingFailed(e.to_string()))?;

    Ok(buffer)
}

/// Photo compressor
#[derive(Debug, Clone, Default)]
pub struct PhotoCompressor {
    options: CompressOptions,
}

impl PhotoCompressor {
    pub fn new(options: CompressOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompressOptions {
        &self.options
    }

    /// Compress image bytes asynchronously
    pub async fn compress(&self, bytes: Vec<u8>) -> Result<CompressedImage, PhotoError> {
        info!(size = bytes.len(), max_dimension = self.options.max_dimension, "Starting compression");

        let options = self.options;
        tokio::task::spawn_blocking(move || compress_image(&bytes, &options))
            .await
            .map_err(|e| PhotoError::EncodingFailed(format!("Compression task error: {}", e)))?
    }

    /// Read and compress an image file
    pub async fn compress_file(&self, path: &Path) -> Result<CompressedImage, PhotoError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PhotoError::DecodeFailed(format!("{}: {}", path.display(), e)))?;
        self.compress(bytes).await
    }

    /// Save a compressed image
    ///
    /// `output` may be a file path or an existing directory; in a directory a
    /// timestamped file name is generated.
    pub async fn save(&self, image: &CompressedImage, output: &Path) -> Result<PathBuf, PhotoError> {
        let filepath = if output.is_dir() {
            let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            output.join(format!("IMG_{}.{}", timestamp, constants::photo::EXTENSION))
        } else {
            output.to_path_buf()
        };

        info!(path = %filepath.display(), "Saving photo");
        tokio::fs::write(&filepath, &image.data)
            .await
            .map_err(|e| PhotoError::EncodingFailed(format!("Failed to save photo: {}", e)))?;
        Ok(filepath)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
        let mut out = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_landscape_is_bounded_by_width() {
        let compressed = compress_image(&png_bytes(1200, 800), &CompressOptions::default()).unwrap();
        assert_eq!((compressed.width, compressed.height), (600, 400));
        assert_eq!(compressed.mime_type, "image/jpeg");

        let decoded = image::load_from_memory(&compressed.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (600, 400));
    }

    #[test]
    fn test_portrait_is_bounded_by_height() {
        let options = CompressOptions::default();
        assert_eq!(options.scaled_dimensions(900, 1600), (338, 600));
    }

    #[test]
    fn test_small_image_is_not_upscaled() {
        let compressed = compress_image(&png_bytes(320, 240), &CompressOptions::default()).unwrap();
        assert_eq!((compressed.width, compressed.height), (320, 240));
    }

    #[test]
    fn test_extreme_aspect_keeps_one_pixel() {
        let options = CompressOptions::new(600, 0.7);
        assert_eq!(options.scaled_dimensions(6000, 1), (600, 1));
    }

    #[test]
    fn test_quality_mapping_and_clamping() {
        assert_eq!(CompressOptions::default().jpeg_quality(), 70);
        assert_eq!(CompressOptions::new(600, 3.0).jpeg_quality(), 100);
        assert_eq!(CompressOptions::new(600, -1.0).jpeg_quality(), 1);
        assert_eq!(CompressOptions::new(600, f32::NAN).jpeg_quality(), 70);
    }

    #[test]
    fn test_garbage_input_is_decode_error() {
        let err = compress_image(b"definitely not an image", &CompressOptions::default()).unwrap_err();
        assert!(matches!(err, PhotoError::DecodeFailed(_)));
    }

    #[test]
    fn test_transparent_png_flattens() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 0]));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        let compressed = compress_image(&bytes, &CompressOptions::default()).unwrap();
        let pixel = image::load_from_memory(&compressed.data).unwrap().to_rgb8();
        assert!(pixel.get_pixel(0, 0)[0] < 16);
    }

    #[test]
    fn test_data_url_roundtrip() {
        let compressed = compress_image(&png_bytes(64, 32), &CompressOptions::default()).unwrap();
        let url = compressed.to_data_url();
        assert!(url.starts_with("data:image/jpeg;base64,"));
        assert_eq!(CompressedImage::from_data_url(&url).unwrap(), compressed);
    }

    #[test]
    fn test_bad_data_urls() {
        assert!(matches!(
            CompressedImage::from_data_url("image/jpeg;base64,AAAA"),
            Err(PhotoError::InvalidDataUrl(_))
        ));
        assert!(matches!(
            CompressedImage::from_data_url("data:image/jpeg,plain"),
            Err(PhotoError::InvalidDataUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_async_compress() {
        let compressor = PhotoCompressor::default();
        let compressed = compressor.compress(png_bytes(1000, 1000)).await.unwrap();
        assert_eq!((compressed.width, compressed.height), (600, 600));
    }
}

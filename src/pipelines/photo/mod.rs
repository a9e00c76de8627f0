// SPDX-License-Identifier: MPL-2.0

//! Photo compression pipeline
//!
//! ```text
//! Source bytes → Decode → Downscale (≤ max_dimension) → JPEG encode → Upload
//!                                  ↓
//!                       CompressedImage (bytes + MIME + size)
//! ```
//!
//! Runs off the async runtime threads; callers just await
//! [`PhotoCompressor::compress`].

pub mod encoding;

pub use encoding::{CompressOptions, CompressedImage, PhotoCompressor, compress_image};

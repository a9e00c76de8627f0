// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing tasks
//!
//! This module contains the detector abstraction and its implementations.

pub mod qr_detector;

#[cfg(feature = "qr-detect")]
pub use qr_detector::QrDetector;
pub use qr_detector::{DetectError, DetectResult, Detector, default_detector};

// SPDX-License-Identifier: MPL-2.0

//! Frame processor module for async frame analysis
//!
//! A [`ScanSession`] owns the camera for one scan attempt; inside it a
//! [`DetectionLoop`] pulls the newest frame, hands it to a [`Detector`] and
//! stops for good on the first decoded payload or on cancellation.

pub mod scan_loop;
pub mod session;
pub mod tasks;
pub mod types;

pub use scan_loop::{DetectionLoop, LoopExit, ScanToken};
pub use session::{ScanSession, SessionExit, SessionState};
pub use tasks::{DetectError, DetectResult, Detector, default_detector, qr_detector};
pub(crate) use types::urlencoding_encode;
pub use types::{FrameRegion, QrDetection, ScanOutcome, ScanPayload, resolve_payload};

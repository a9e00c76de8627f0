// SPDX-License-Identifier: MPL-2.0

//! Processing pipelines
//!
//! # Pipeline Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Source image │ ──▶ │  Photo Pipeline   │ ──▶ │  JPEG bytes  │
//! │ (any format) │     │  - Decode         │     │  / data URL  │
//! │              │     │  - Downscale      │     │              │
//! │              │     │  - Encoding       │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`photo`]: Item photo compression before upload

pub mod photo;

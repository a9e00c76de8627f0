// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera capture
//!
//! The backend layer abstracts hardware access, providing a consistent API
//! regardless of the underlying capture method:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  App Layer                   │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌──────────────────┐  ┌──────────────────┐ │
//! │  │  Camera (V4L2)   │  │  Camera (File)   │ │
//! │  └──────────────────┘  └──────────────────┘ │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Inventory persistence lives in [`crate::inventory`]; it talks to the
//! network, not to hardware.

pub mod camera;

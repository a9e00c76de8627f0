// SPDX-License-Identifier: MPL-2.0

//! Main application module for boxtrack
//!
//! This module contains the application state, message handling and the
//! effect driver. Nothing here depends on a rendering toolkit: a front end
//! feeds [`Message`]s in and renders from [`AppState`].
//!
//! # Architecture
//!
//! - `state`: Application state types (AppState, View, Message, Effect)
//! - `update`: Message dispatch
//! - `handlers`: Message handlers grouped by domain
//! - `driver`: Runs effects against the inventory, photo and camera layers
//! - `frame_processor`: Scan sessions and QR detection
//!
//! # Main Types
//!
//! - `AppState`: All UI state, with the `View` state machine
//! - `Message`: All possible user interactions and system events
//! - `Effect`: Work requested by the state for the driver to perform

mod driver;
pub mod frame_processor;
mod handlers;
mod state;
mod update;

pub use driver::AppDriver;
pub use state::{
    AddBoxForm, AddItemForm, AppState, DetailState, Effect, ItemLayout, Message, ScannerState,
    Toast, ToastKind, View,
};

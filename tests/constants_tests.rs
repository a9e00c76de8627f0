// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use boxtrack::constants::{self, BOX_COLORS, DEFAULT_BOX_COLOR};
use std::collections::HashSet;

#[test]
fn test_box_palette() {
    assert_eq!(BOX_COLORS.len(), 10);
    assert_eq!(DEFAULT_BOX_COLOR, "#3B82F6");

    let unique: HashSet<_> = BOX_COLORS.iter().collect();
    assert_eq!(unique.len(), BOX_COLORS.len(), "Palette colours should be distinct");
}

#[test]
fn test_palette_entries_are_hex_colours() {
    for color in BOX_COLORS {
        assert_eq!(color.len(), 7, "{} should be #RRGGBB", color);
        assert!(color.starts_with('#'));
        assert!(color[1..].chars().all(|c| c.is_ascii_hexdigit()));
    }
}

#[test]
fn test_photo_defaults() {
    assert_eq!(constants::photo::MAX_DIMENSION, 600);
    assert!((constants::photo::QUALITY - 0.7).abs() < f32::EPSILON);
    assert_eq!(constants::photo::MIME_TYPE, "image/jpeg");
}

#[test]
fn test_qr_sizes() {
    assert!(constants::qr::DISPLAY_SIZE < constants::qr::DOWNLOAD_SIZE);
    assert_eq!(constants::qr::BOX_PARAM, "box");
}

#[test]
fn test_toast_duration() {
    assert_eq!(constants::TOAST_DURATION.as_millis(), 2500);
}

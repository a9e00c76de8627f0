// SPDX-License-Identifier: GPL-3.0-only

//! Locator URLs, QR image URLs and photo object paths

use crate::app::frame_processor::urlencoding_encode;
use crate::constants;

/// URL printed into a box's QR code: `<base_url>?box=<id>`
///
/// An existing query string on `base_url` is extended rather than replaced.
pub fn box_locator(base_url: &str, box_id: &str) -> String {
    let base = base_url.split('#').next().unwrap_or(base_url);
    let separator = match base.split_once('?') {
        None => "?",
        Some((_, "")) => "",
        Some(_) => "&",
    };
    format!(
        "{}{}{}={}",
        base,
        separator,
        constants::qr::BOX_PARAM,
        urlencoding_encode(box_id)
    )
}

/// Image URL of a rendered QR code for `text` at `size`×`size` pixels
pub fn qr_image_url(text: &str, size: u32) -> String {
    format!(
        "{}?size={size}x{size}&data={}&bgcolor={}&color={}&format=svg",
        constants::qr::RENDER_ENDPOINT,
        urlencoding_encode(text),
        constants::qr::RENDER_BACKGROUND,
        constants::qr::RENDER_FOREGROUND,
        size = size,
    )
}

/// Object path for an item photo: `<box_id>/<unix_millis>.jpg`
pub fn photo_object_path(box_id: &str, unix_millis: i64) -> String {
    format!("{}/{}.{}", box_id, unix_millis, constants::photo::EXTENSION)
}

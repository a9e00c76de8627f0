// SPDX-License-Identifier: MPL-2.0

//! Core types for frame processing results
//!
//! A QR detection carries where the code sits in the frame and the raw text it
//! decoded to. What that text means for the inventory is decided by
//! [`ScanPayload`]: either a box locator URL or a bare box identifier.

use crate::constants;
use crate::inventory::StorageBox;

/// A rectangular region within a frame
///
/// Coordinates are normalized (0.0 to 1.0) relative to the frame dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRegion {
    /// Left edge (0.0 = left of frame, 1.0 = right of frame)
    pub x: f32,
    /// Top edge (0.0 = top of frame, 1.0 = bottom of frame)
    pub y: f32,
    /// Width as fraction of frame width
    pub width: f32,
    /// Height as fraction of frame height
    pub height: f32,
}

impl FrameRegion {
    /// Create a frame region from pixel coordinates
    pub fn from_pixels(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        Self {
            x: x as f32 / frame_width as f32,
            y: y as f32 / frame_height as f32,
            width: width as f32 / frame_width as f32,
            height: height as f32 / frame_height as f32,
        }
    }
}

/// A detected QR code with its location and decoded content
#[derive(Debug, Clone, PartialEq)]
pub struct QrDetection {
    /// Bounding box of the QR code in normalized frame coordinates
    pub bounds: FrameRegion,
    /// Raw content decoded from the QR code
    pub content: String,
}

impl QrDetection {
    pub fn new(bounds: FrameRegion, content: String) -> Self {
        Self { bounds, content }
    }
}

/// How a decoded QR string refers to a box
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanPayload {
    /// A URL carrying the box id in its `box` query parameter
    Locator { box_id: String },
    /// Anything else, used verbatim as a box id
    BareId(String),
}

impl ScanPayload {
    /// Classify a decoded string
    ///
    /// Any absolute URL (`scheme:...`) with a `box` query parameter is a
    /// locator; surrounding whitespace is ignored for URL parsing only. Every
    /// other payload is kept byte for byte as a bare id.
    pub fn parse(content: &str) -> Self {
        if let Some(box_id) = locator_box_param(content.trim()) {
            return Self::Locator { box_id };
        }

        Self::BareId(content.to_string())
    }

    /// Box identifiers to try, in order
    fn candidate(&self) -> &str {
        match self {
            Self::Locator { box_id } => box_id,
            Self::BareId(id) => id,
        }
    }
}

/// Result of matching a payload against the known boxes
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// Index into the box list and the matching box id
    Found { index: usize, box_id: String },
    /// No box matches; informational, not an error
    NotFound,
}

/// Resolve a decoded QR payload against the known boxes
pub fn resolve_payload(content: &str, boxes: &[StorageBox]) -> ScanOutcome {
    let payload = ScanPayload::parse(content);
    let find = |id: &str| boxes.iter().position(|b| b.id == id);

    let mut index = find(payload.candidate());
    // A locator whose box param is unknown still gets the bare-id lookup
    if index.is_none() && matches!(payload, ScanPayload::Locator { .. }) {
        index = find(content);
    }

    match index {
        Some(index) => ScanOutcome::Found {
            index,
            box_id: boxes[index].id.clone(),
        },
        None => ScanOutcome::NotFound,
    }
}

/// Extract the `box` query parameter from an absolute URL of any scheme
fn locator_box_param(s: &str) -> Option<String> {
    let (scheme, rest) = s.split_once(':')?;
    if !is_url_scheme(scheme) {
        return None;
    }
    let query = rest.split_once('?')?.1;
    let query = query.split('#').next().unwrap_or(query);

    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        (urlencoding_decode(key) == constants::qr::BOX_PARAM).then(|| urlencoding_decode(value))
    })
}

/// ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )
fn is_url_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// URL encoding for query parameter values
///
/// Matches JavaScript's `encodeURIComponent`.
pub(crate) fn urlencoding_encode(s: &str) -> String {
    let mut result = String::with_capacity(s.len() * 3);
    for c in s.chars() {
        match c {
            'A'..='Z'
            | 'a'..='z'
            | '0'..='9'
            | '-'
            | '_'
            | '.'
            | '~'
            | '!'
            | '*'
            | '\''
            | '('
            | ')' => result.push(c),
            _ => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).as_bytes() {
                    result.push('%');
                    result.push_str(&format!("{:02X}", byte));
                }
            }
        }
    }
    result
}

/// URL decoding for query parameters
///
/// Percent escapes are collected as bytes so multi-byte UTF-8 survives;
/// invalid sequences are replaced rather than rejected.
pub(crate) fn urlencoding_decode(s: &str) -> String {
    let mut bytes = Vec::with_capacity(s.len());
    let raw = s.as_bytes();
    let mut i = 0;

    while i < raw.len() {
        match raw[i] {
            b'%' if i + 2 < raw.len() => {
                let hex = std::str::from_utf8(&raw[i + 1..i + 3]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(byte) => {
                        bytes.push(byte);
                        i += 3;
                    }
                    None => {
                        bytes.push(b'%');
                        i += 1;
                    }
                }
            }
            b'+' => {
                bytes.push(b' ');
                i += 1;
            }
            other => {
                bytes.push(other);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}

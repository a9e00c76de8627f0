// SPDX-License-Identifier: GPL-3.0-only

//! Application state management

use crate::app::frame_processor::SessionState;
use crate::constants;
use crate::inventory::{
    BoxUpdate, NewBox, NewItem, SearchHit, StorageBox, box_locator, qr_image_url,
    search_boxes,
};
use crate::pipelines::photo::CompressedImage;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Top-level screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum View {
    /// Box list and search
    #[default]
    Home,
    /// One box with its items
    BoxDetail { box_id: String },
    /// New box form
    AddBox,
}

impl View {
    pub fn is_home(&self) -> bool {
        matches!(self, View::Home)
    }

    pub fn box_id(&self) -> Option<&str> {
        match self {
            View::BoxDetail { box_id } => Some(box_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Warn,
}

/// Short-lived notification
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    /// Increments per toast so a stale expiry timer cannot hide a newer one
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
    pub expires_at: Instant,
}

impl Toast {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Item list layout inside a box
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ItemLayout {
    #[default]
    List,
    /// Photo grid, offered only when at least one item has a photo
    Grid,
}

/// New box form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddBoxForm {
    pub name: String,
    pub location: String,
}

impl AddBoxForm {
    /// The submit button is enabled
    pub fn can_submit(&self, syncing: bool) -> bool {
        !self.name.trim().is_empty() && !syncing
    }
}

/// New item form inside a box
#[derive(Debug, Clone, PartialEq)]
pub struct AddItemForm {
    pub open: bool,
    pub name: String,
    pub note: String,
    pub qty: String,
    pub photo: Option<CompressedImage>,
    /// A photo is being compressed
    pub compressing: bool,
}

impl Default for AddItemForm {
    fn default() -> Self {
        Self {
            open: false,
            name: String::new(),
            note: String::new(),
            qty: "1".to_string(),
            photo: None,
            compressing: false,
        }
    }
}

impl AddItemForm {
    pub fn can_submit(&self, syncing: bool) -> bool {
        !self.name.trim().is_empty() && !syncing && !self.compressing
    }

    pub fn to_new_item(&self) -> NewItem {
        let mut item =
            NewItem::new(self.name.trim()).with_qty(NewItem::parse_qty(&self.qty));
        if !self.note.trim().is_empty() {
            item = item.with_note(self.note.trim());
        }
        item
    }

    /// Clear the fields but keep the form open for the next entry
    pub fn reset_fields(&mut self) {
        *self = Self {
            open: self.open,
            ..Self::default()
        };
    }
}

/// Per-box screen state, reset whenever a box is opened
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailState {
    pub add_item: AddItemForm,
    pub show_qr: bool,
    pub confirm_delete: bool,
    pub layout: ItemLayout,
}

/// Scanner overlay
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScannerState {
    pub open: bool,
    /// Id of the session started by the latest open; reports from older
    /// sessions carry a different id and are dropped
    pub scan_id: u64,
    /// Last reported camera session state
    pub session: Option<SessionState>,
}

impl ScannerState {
    /// A report from session `scan_id` applies to the open overlay
    pub fn is_current(&self, scan_id: u64) -> bool {
        self.open && self.scan_id == scan_id
    }
}

/// All UI state, independent of any rendering toolkit
#[derive(Debug, Clone)]
pub struct AppState {
    /// Newest first, as returned by the backend
    pub boxes: Vec<StorageBox>,
    /// The first load has completed
    pub loaded: bool,
    pub view: View,
    pub search: String,
    pub toast: Option<Toast>,
    /// A write to the backend is in flight
    pub syncing: bool,
    pub scanner: ScannerState,
    /// Full-size photo being shown
    pub lightbox: Option<String>,
    pub add_box: AddBoxForm,
    pub detail: DetailState,
    /// Box to open once the first load completes
    pub deep_link: Option<String>,
    /// Base URL printed into QR codes
    pub base_url: String,
    pub(crate) next_toast_id: u64,
}

impl AppState {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            boxes: Vec::new(),
            loaded: false,
            view: View::Home,
            search: String::new(),
            toast: None,
            syncing: false,
            scanner: ScannerState::default(),
            lightbox: None,
            add_box: AddBoxForm::default(),
            detail: DetailState::default(),
            deep_link: None,
            base_url: base_url.into(),
            next_toast_id: 0,
        }
    }

    /// Open `box_id` once boxes are loaded, if it exists
    pub fn with_deep_link(mut self, box_id: Option<String>) -> Self {
        self.deep_link = box_id.filter(|id| !id.trim().is_empty());
        self
    }

    pub fn find_box(&self, box_id: &str) -> Option<&StorageBox> {
        self.boxes.iter().find(|b| b.id == box_id)
    }

    /// The box shown in the detail view
    pub fn current_box(&self) -> Option<&StorageBox> {
        self.view.box_id().and_then(|id| self.find_box(id))
    }

    pub fn search_results(&self) -> Vec<SearchHit<'_>> {
        search_boxes(&self.boxes, &self.search)
    }

    /// Title shown in the header
    pub fn title(&self) -> String {
        match &self.view {
            View::Home => "Boxes".to_string(),
            View::BoxDetail { .. } => self
                .current_box()
                .map(|b| b.name.clone())
                .unwrap_or_default(),
            View::AddBox => "New box".to_string(),
        }
    }

    /// Locator URL encoded into a box's QR code
    pub fn locator_for(&self, box_id: &str) -> String {
        box_locator(&self.base_url, box_id)
    }

    /// Rendered QR image URL for a box
    pub fn qr_image_for(&self, box_id: &str, size: u32) -> String {
        qr_image_url(&self.locator_for(box_id), size)
    }

    /// Whether the photo grid layout can be offered for the current box
    pub fn has_photos(&self) -> bool {
        self.current_box()
            .is_some_and(|b| b.items.iter().any(|i| i.photo_url.is_some()))
    }

    /// Palette colour for the next new box
    pub fn next_box_color(&self) -> &'static str {
        constants::BOX_COLORS[self.boxes.len() % constants::BOX_COLORS.len()]
    }

    pub(crate) fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) -> Effect {
        self.next_toast_id += 1;
        let toast = Toast {
            id: self.next_toast_id,
            message: message.into(),
            kind,
            expires_at: Instant::now() + constants::TOAST_DURATION,
        };
        let effect = Effect::ExpireToast {
            id: toast.id,
            after: constants::TOAST_DURATION,
        };
        self.toast = Some(toast);
        effect
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(String::new())
    }
}

/// Everything that can change the state
#[derive(Debug, Clone)]
pub enum Message {
    // ===== Navigation =====
    OpenBox(String),
    GoHome,
    StartAddBox,
    /// Leave the add box form
    Cancel,
    SearchChanged(String),
    ClearSearch,

    // ===== Data =====
    /// Result of the initial load
    BoxesLoaded(Vec<StorageBox>),

    // ===== Add box =====
    AddBoxNameChanged(String),
    AddBoxLocationChanged(String),
    SubmitBox,
    /// `Some` with the refreshed list on success
    BoxCreated(Option<Vec<StorageBox>>),

    // ===== Box detail =====
    ToggleQr,
    ToggleAddItem,
    SetItemLayout(ItemLayout),
    UpdateBox(BoxUpdate),
    RequestDeleteBox,
    CancelDeleteBox,
    /// `Some` with the refreshed list when the backend accepted the update
    BoxUpdated(Option<Vec<StorageBox>>),
    ConfirmDeleteBox,
    /// `Some` with the refreshed list on success
    BoxDeleted(Option<Vec<StorageBox>>),

    // ===== Items =====
    ItemNameChanged(String),
    ItemNoteChanged(String),
    ItemQtyChanged(String),
    /// Photo file chosen by the user; compressed before upload
    ItemPhotoSelected(PathBuf),
    ItemPhotoCompressed(Result<CompressedImage, String>),
    RemoveItemPhoto,
    SubmitItem,
    ItemCreated(Option<Vec<StorageBox>>),
    DeleteItem(String),
    ItemDeleted(Option<Vec<StorageBox>>),

    // ===== Scanner =====
    OpenScanner,
    CloseScanner,
    ScannerStateChanged { scan_id: u64, state: SessionState },
    /// Decoded QR payload
    ScanResult { scan_id: u64, payload: String },
    /// Session ended without a payload
    ScannerEnded(u64),

    // ===== Overlays =====
    OpenLightbox(String),
    CloseLightbox,
    ToastExpired(u64),
}

/// Work for the driver; each effect produces at most one follow-up message
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadBoxes,
    CreateBox(NewBox),
    UpdateBox { box_id: String, update: BoxUpdate },
    DeleteBox(String),
    CompressPhoto(PathBuf),
    CreateItem {
        box_id: String,
        item: NewItem,
        photo: Option<CompressedImage>,
    },
    DeleteItem(String),
    StartScan(u64),
    StopScan,
    ExpireToast { id: u64, after: Duration },
}


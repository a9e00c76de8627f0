// SPDX-License-Identifier: MPL-2.0

//! Integration tests for application state transitions and the effect driver

use boxtrack::app::frame_processor::{
    DetectResult, Detector, FrameRegion, QrDetection, SessionState,
};
use boxtrack::app::{AppDriver, AppState, Effect, ItemLayout, Message, ToastKind, View};
use boxtrack::backends::camera::{
    BackendResult, CameraBackend, CameraBackendManager, CameraBackendType, CameraDevice,
    CameraFrame, FileSourceBackend, LiveStream, StreamConstraints,
};
use boxtrack::constants::BOX_COLORS;
use boxtrack::errors::StoreError;
use boxtrack::inventory::{
    BoxUpdate, InventoryBackend, InventoryService, Item, ItemRow, MemoryBackend, NewBox, NewItem,
    StorageBox, StoreResult,
};
use boxtrack::pipelines::photo::{CompressOptions, PhotoCompressor};
use futures::future::BoxFuture;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

fn storage_box(id: &str, name: &str) -> StorageBox {
    StorageBox {
        id: id.to_string(),
        name: name.to_string(),
        ..Default::default()
    }
}

/// A payload reported by the scanner's current session
fn scan_result(state: &AppState, payload: &str) -> Message {
    Message::ScanResult {
        scan_id: state.scanner.scan_id,
        payload: payload.to_string(),
    }
}

fn loaded_state(boxes: Vec<StorageBox>) -> AppState {
    let mut state = AppState::new("https://boxes.example/");
    state.update(Message::BoxesLoaded(boxes));
    state
}

struct Finds(String);

impl Detector for Finds {
    fn detect(&self, frame: Arc<CameraFrame>) -> BoxFuture<'_, DetectResult> {
        let detection = QrDetection::new(
            FrameRegion::from_pixels(0, 0, 1, 1, frame.width, frame.height),
            self.0.clone(),
        );
        Box::pin(async move { Ok(vec![detection]) })
    }
}

/// Database that refuses deletes; everything else goes to memory
struct RefusesDeletes(MemoryBackend);

fn refused() -> StoreError {
    StoreError::Status {
        status: 500,
        message: "delete refused".to_string(),
    }
}

impl InventoryBackend for RefusesDeletes {
    async fn fetch_boxes(&self) -> StoreResult<Vec<StorageBox>> {
        self.0.fetch_boxes().await
    }

    async fn insert_box(&self, new_box: &NewBox) -> StoreResult<StorageBox> {
        self.0.insert_box(new_box).await
    }

    async fn update_box(&self, _box_id: &str, _update: &BoxUpdate) -> StoreResult<()> {
        Err(refused())
    }

    async fn delete_box(&self, _box_id: &str) -> StoreResult<()> {
        Err(refused())
    }

    async fn item_photo_paths(&self, box_id: &str) -> StoreResult<Vec<String>> {
        self.0.item_photo_paths(box_id).await
    }

    async fn delete_items_in_box(&self, _box_id: &str) -> StoreResult<()> {
        Err(refused())
    }

    async fn insert_item(&self, row: &ItemRow) -> StoreResult<Item> {
        self.0.insert_item(row).await
    }

    async fn item_photo_path(&self, item_id: &str) -> StoreResult<Option<String>> {
        self.0.item_photo_path(item_id).await
    }

    async fn delete_item(&self, _item_id: &str) -> StoreResult<()> {
        Err(refused())
    }
}

/// File source whose open blocks for a while, like a permission prompt
struct SlowCamera {
    inner: FileSourceBackend,
    delay: Duration,
}

impl CameraBackend for SlowCamera {
    fn backend_type(&self) -> CameraBackendType {
        self.inner.backend_type()
    }

    fn is_available(&self) -> bool {
        true
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        self.inner.enumerate_cameras()
    }

    fn open(&self, constraints: &StreamConstraints) -> BackendResult<LiveStream> {
        std::thread::sleep(self.delay);
        self.inner.open(constraints)
    }
}

struct Workspace(PathBuf);

impl Workspace {
    fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("boxtrack-app-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }

    fn image(&self, name: &str, width: u32, height: u32) -> PathBuf {
        let path = self.0.join(name);
        image::RgbImage::from_pixel(width, height, image::Rgb([200, 120, 40]))
            .save(&path)
            .unwrap();
        path
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.0).ok();
    }
}

type Driver = AppDriver<MemoryBackend, MemoryBackend>;

fn driver(
    backend: Arc<MemoryBackend>,
    camera_image: &Path,
    detector: Option<Arc<dyn Detector>>,
) -> (Driver, mpsc::UnboundedReceiver<Message>) {
    AppDriver::new(
        InventoryService::from_backend(backend),
        PhotoCompressor::new(CompressOptions::default()),
        CameraBackendManager::with_backend(Arc::new(
            FileSourceBackend::new(camera_image).with_frame_interval(Duration::from_millis(5)),
        )),
        detector,
        StreamConstraints::default(),
    )
}

#[test]
fn test_deep_link_opens_box_after_load() {
    let mut state = AppState::new("https://boxes.example/").with_deep_link(Some("42".into()));
    assert!(!state.loaded);

    state.update(Message::BoxesLoaded(vec![
        storage_box("1", "Shoes"),
        storage_box("42", "Cables"),
    ]));

    assert!(state.loaded);
    assert_eq!(state.view, View::BoxDetail { box_id: "42".into() });
    assert_eq!(state.title(), "Cables");
    assert!(state.deep_link.is_none());
}

#[test]
fn test_unknown_deep_link_stays_home() {
    let mut state = AppState::new("").with_deep_link(Some("missing".into()));
    state.update(Message::BoxesLoaded(vec![storage_box("1", "Shoes")]));
    assert_eq!(state.view, View::Home);
}

#[test]
fn test_go_home_clears_search_and_detail() {
    let mut state = loaded_state(vec![storage_box("1", "Shoes")]);
    state.update(Message::SearchChanged("sho".into()));
    state.update(Message::OpenBox("1".into()));
    state.update(Message::ToggleQr);
    state.update(Message::SetItemLayout(ItemLayout::Grid));
    assert!(state.detail.show_qr);

    state.update(Message::GoHome);
    assert_eq!(state.view, View::Home);
    assert!(state.search.is_empty());
    assert!(!state.detail.show_qr);
    assert_eq!(state.detail.layout, ItemLayout::List);
}

#[test]
fn test_cancel_leaves_add_box_form() {
    let mut state = loaded_state(Vec::new());
    state.update(Message::StartAddBox);
    state.update(Message::AddBoxNameChanged("Draft".into()));
    assert_eq!(state.view, View::AddBox);

    state.update(Message::Cancel);
    assert_eq!(state.view, View::Home);
    assert!(state.add_box.name.is_empty());
}

#[test]
fn test_add_box_requires_name_and_idle_backend() {
    let mut state = loaded_state(Vec::new());
    state.update(Message::StartAddBox);
    state.update(Message::AddBoxNameChanged("   ".into()));
    assert!(state.update(Message::SubmitBox).is_empty());

    state.update(Message::AddBoxNameChanged("Cables".into()));
    state.syncing = true;
    assert!(state.update(Message::SubmitBox).is_empty());

    state.syncing = false;
    let effects = state.update(Message::SubmitBox);
    assert!(state.syncing);
    match effects.as_slice() {
        [Effect::CreateBox(new_box)] => {
            assert_eq!(new_box.name, "Cables");
            assert_eq!(new_box.location, None);
            assert_eq!(new_box.color.as_deref(), Some(BOX_COLORS[0]));
        }
        other => panic!("unexpected effects {:?}", other),
    }
}

#[test]
fn test_scan_result_found_opens_box() {
    let mut state = loaded_state(vec![storage_box("42", "Cables")]);
    state.update(Message::OpenScanner);
    assert!(state.scanner.open);

    let effects = state.update(scan_result(&state, "https://boxes.example/?box=42"));
    assert!(effects.contains(&Effect::StopScan));
    assert!(!state.scanner.open);
    assert_eq!(state.view, View::BoxDetail { box_id: "42".into() });

    let toast = state.toast.as_ref().unwrap();
    assert_eq!(toast.message, "Found: Cables");
    assert_eq!(toast.kind, ToastKind::Success);
}

#[test]
fn test_scan_result_not_found_warns() {
    let mut state = loaded_state(vec![storage_box("42", "Cables")]);
    state.update(Message::OpenScanner);
    state.update(scan_result(&state, "99"));

    assert_eq!(state.view, View::Home);
    assert!(!state.scanner.open);
    let toast = state.toast.as_ref().unwrap();
    assert_eq!(toast.message, "No matching box found");
    assert_eq!(toast.kind, ToastKind::Warn);
}

#[test]
fn test_scan_result_after_close_is_ignored() {
    let mut state = loaded_state(vec![storage_box("42", "Cables")]);
    state.update(Message::OpenScanner);
    assert_eq!(state.update(Message::CloseScanner), vec![Effect::StopScan]);

    assert!(state.update(scan_result(&state, "42")).is_empty());
    assert_eq!(state.view, View::Home);
    assert!(state.toast.is_none());
}

#[test]
fn test_scanner_error_is_kept_for_display() {
    let mut state = loaded_state(Vec::new());
    state.update(Message::OpenScanner);
    let scan_id = state.scanner.scan_id;
    state.update(Message::ScannerStateChanged {
        scan_id,
        state: SessionState::Error("Camera access denied".into()),
    });
    state.update(Message::ScannerEnded(scan_id));

    assert!(state.scanner.open);
    assert_eq!(
        state.scanner.session,
        Some(SessionState::Error("Camera access denied".into()))
    );
}

#[test]
fn test_stale_toast_timer_keeps_newer_toast() {
    let mut state = loaded_state(vec![storage_box("42", "Cables")]);
    state.update(Message::OpenScanner);
    let first = state.update(scan_result(&state, "nope"));
    let first_id = first
        .iter()
        .find_map(|e| match e {
            Effect::ExpireToast { id, after } => {
                assert_eq!(*after, Duration::from_millis(2500));
                Some(*id)
            }
            _ => None,
        })
        .unwrap();

    state.update(Message::OpenScanner);
    state.update(scan_result(&state, "42"));

    state.update(Message::ToastExpired(first_id));
    assert_eq!(state.toast.as_ref().unwrap().message, "Found: Cables");

    let current = state.toast.as_ref().unwrap().id;
    state.update(Message::ToastExpired(current));
    assert!(state.toast.is_none());
}

#[test]
fn test_search_results_follow_search_text() {
    let mut cables = storage_box("42", "Cables");
    cables.items.push(Item {
        id: "1".into(),
        box_id: "42".into(),
        name: "HDMI lead".into(),
        qty: 1,
        ..Default::default()
    });
    let mut state = loaded_state(vec![storage_box("7", "Shoes"), cables]);
    assert!(state.view.is_home());

    state.update(Message::SearchChanged("hdmi".into()));
    let hits = state.search_results();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].storage_box.id, "42");
    assert_eq!(hits[0].items.len(), 1);

    state.update(Message::ClearSearch);
    assert!(state.search.is_empty());
}

#[test]
fn test_toast_expiry_time() {
    let mut state = loaded_state(Vec::new());
    state.update(Message::OpenScanner);
    state.update(scan_result(&state, "nothing"));
    let toast = state.toast.as_ref().unwrap();
    assert_eq!(toast.kind, ToastKind::Warn);
    assert!(!toast.is_expired(Instant::now()));
    assert!(toast.is_expired(Instant::now() + Duration::from_secs(3)));
}

#[test]
fn test_qr_links_use_base_url() {
    let state = loaded_state(vec![storage_box("42", "Cables")]);
    assert_eq!(state.locator_for("42"), "https://boxes.example/?box=42");
    assert!(state.qr_image_for("42", 250).contains("size=250x250"));
}

#[tokio::test]
async fn test_driver_add_box_then_item_with_photo() {
    let workspace = Workspace::new();
    let camera_image = workspace.image("camera.png", 8, 8);
    let photo = workspace.image("photo.png", 1200, 800);
    let backend = Arc::new(MemoryBackend::new());
    let (mut driver, _messages) = driver(Arc::clone(&backend), &camera_image, None);

    let mut state = AppState::new("https://boxes.example/");
    let loaded = driver.run(Effect::LoadBoxes).await.unwrap();
    driver.dispatch(&mut state, loaded).await;
    assert!(state.loaded);
    assert!(state.boxes.is_empty());

    driver.dispatch(&mut state, Message::StartAddBox).await;
    driver
        .dispatch(&mut state, Message::AddBoxNameChanged("Camping".into()))
        .await;
    driver
        .dispatch(&mut state, Message::AddBoxLocationChanged("Garage".into()))
        .await;
    driver.dispatch(&mut state, Message::SubmitBox).await;

    assert!(!state.syncing);
    assert_eq!(state.view, View::Home);
    assert_eq!(state.boxes.len(), 1);
    assert_eq!(state.boxes[0].location.as_deref(), Some("Garage"));
    assert_eq!(state.toast.as_ref().unwrap().message, "Box added!");

    let box_id = state.boxes[0].id.clone();
    driver.dispatch(&mut state, Message::OpenBox(box_id.clone())).await;
    driver.dispatch(&mut state, Message::ToggleAddItem).await;
    driver
        .dispatch(&mut state, Message::ItemNameChanged("Tent".into()))
        .await;
    driver
        .dispatch(&mut state, Message::ItemQtyChanged("2".into()))
        .await;
    driver
        .dispatch(&mut state, Message::ItemPhotoSelected(photo))
        .await;

    let compressed = state.detail.add_item.photo.as_ref().unwrap();
    assert_eq!((compressed.width, compressed.height), (600, 400));

    driver.dispatch(&mut state, Message::SubmitItem).await;
    assert!(!state.syncing);
    assert_eq!(state.toast.as_ref().unwrap().message, "Item added!");
    assert!(state.detail.add_item.name.is_empty());
    assert!(state.detail.add_item.photo.is_none());
    assert!(state.detail.add_item.open, "form stays open for the next item");

    let item = &state.current_box().unwrap().items[0];
    assert_eq!(item.name, "Tent");
    assert_eq!(item.qty, 2);
    assert!(item.photo_url.is_some());
    assert!(state.has_photos());
    assert_eq!(backend.photo_count(), 1);

    driver.dispatch(&mut state, Message::RequestDeleteBox).await;
    driver.dispatch(&mut state, Message::ConfirmDeleteBox).await;
    assert_eq!(state.view, View::Home);
    assert!(state.boxes.is_empty());
    assert_eq!(backend.photo_count(), 0);
    assert_eq!(state.toast.as_ref().unwrap().kind, ToastKind::Warn);
}

#[test]
fn test_reopened_scanner_ignores_old_session() {
    let mut state = loaded_state(vec![storage_box("42", "Cables")]);
    assert_eq!(state.update(Message::OpenScanner), vec![Effect::StartScan(1)]);
    state.update(Message::CloseScanner);
    assert_eq!(state.update(Message::OpenScanner), vec![Effect::StartScan(2)]);

    assert!(state.update(Message::ScannerEnded(1)).is_empty());
    assert!(state
        .update(Message::ScannerStateChanged {
            scan_id: 1,
            state: SessionState::Error("Camera stream ended".into()),
        })
        .is_empty());
    assert!(state
        .update(Message::ScanResult {
            scan_id: 1,
            payload: "42".into(),
        })
        .is_empty());

    assert!(state.scanner.open);
    assert_eq!(state.scanner.session, Some(SessionState::Starting));
    assert_eq!(state.view, View::Home);
    assert!(state.toast.is_none());

    state.update(Message::ScannerStateChanged {
        scan_id: 2,
        state: SessionState::Scanning,
    });
    assert_eq!(state.scanner.session, Some(SessionState::Scanning));
}

#[test]
fn test_failed_delete_keeps_box_open() {
    let mut state = loaded_state(vec![storage_box("42", "Cables")]);
    state.update(Message::OpenBox("42".into()));
    state.update(Message::RequestDeleteBox);
    assert_eq!(
        state.update(Message::ConfirmDeleteBox),
        vec![Effect::DeleteBox("42".into())]
    );
    assert!(state.syncing);

    state.update(Message::BoxDeleted(None));
    assert!(!state.syncing);
    assert!(!state.detail.confirm_delete);
    assert_eq!(state.view, View::BoxDetail { box_id: "42".into() });
    assert_eq!(state.boxes.len(), 1);
    let toast = state.toast.as_ref().unwrap();
    assert_eq!(toast.message, "Failed to delete box");
    assert_eq!(toast.kind, ToastKind::Warn);
}

#[tokio::test]
async fn test_driver_refused_writes_warn_and_keep_state() {
    let workspace = Workspace::new();
    let camera_image = workspace.image("camera.png", 8, 8);
    let memory = MemoryBackend::new();
    let created = memory.insert_box(&NewBox::new("Cables")).await.unwrap();
    let row = ItemRow::new(&created.id, NewItem::new("HDMI lead"));
    let item = memory.insert_item(&row).await.unwrap();

    let service = InventoryService::new(
        Arc::new(RefusesDeletes(memory)),
        Arc::new(MemoryBackend::new()),
    );
    let (mut driver, _messages) = AppDriver::new(
        service,
        PhotoCompressor::new(CompressOptions::default()),
        CameraBackendManager::with_backend(Arc::new(FileSourceBackend::new(&camera_image))),
        None,
        StreamConstraints::default(),
    );

    let mut state = AppState::new("https://boxes.example/");
    let loaded = driver.run(Effect::LoadBoxes).await.unwrap();
    driver.dispatch(&mut state, loaded).await;
    driver.dispatch(&mut state, Message::OpenBox(created.id.clone())).await;

    driver.dispatch(&mut state, Message::RequestDeleteBox).await;
    driver.dispatch(&mut state, Message::ConfirmDeleteBox).await;
    assert_eq!(state.view, View::BoxDetail { box_id: created.id.clone() });
    assert_eq!(state.toast.as_ref().unwrap().message, "Failed to delete box");
    assert!(!state.syncing);
    assert_eq!(driver.service().load_boxes().await.len(), 1);

    driver.dispatch(&mut state, Message::DeleteItem(item.id.clone())).await;
    assert_eq!(state.toast.as_ref().unwrap().message, "Failed to delete item");
    assert_eq!(state.current_box().unwrap().items.len(), 1);
    assert!(!state.syncing);

    driver
        .dispatch(
            &mut state,
            Message::UpdateBox(BoxUpdate {
                location: Some("Attic".into()),
                ..Default::default()
            }),
        )
        .await;
    assert_eq!(state.toast.as_ref().unwrap().message, "Failed to update box");
    assert_eq!(state.current_box().unwrap().location, None);
}

#[tokio::test]
async fn test_driver_reopen_while_camera_opens() {
    let workspace = Workspace::new();
    let camera_image = workspace.image("camera.png", 8, 8);
    let camera = SlowCamera {
        inner: FileSourceBackend::new(&camera_image).with_frame_interval(Duration::from_millis(5)),
        delay: Duration::from_millis(300),
    };
    let (mut driver, mut messages) = AppDriver::new(
        InventoryService::from_backend(Arc::new(MemoryBackend::new())),
        PhotoCompressor::new(CompressOptions::default()),
        CameraBackendManager::with_backend(Arc::new(camera)),
        None,
        StreamConstraints::default(),
    );

    let mut state = loaded_state(Vec::new());
    driver.dispatch(&mut state, Message::OpenScanner).await;
    driver.dispatch(&mut state, Message::CloseScanner).await;
    driver.dispatch(&mut state, Message::OpenScanner).await;
    assert_eq!(state.scanner.scan_id, 2);

    let mut first_session_ended = false;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while let Ok(Some(message)) = tokio::time::timeout_at(deadline, messages.recv()).await {
        if matches!(message, Message::ScannerEnded(1)) {
            first_session_ended = true;
        }
        driver.dispatch(&mut state, message).await;
    }

    assert!(first_session_ended);
    assert!(state.scanner.open);
    assert_eq!(state.scanner.session, Some(SessionState::NoDetectorAvailable));

    driver.dispatch(&mut state, Message::CloseScanner).await;
    assert!(!driver.is_scanning());
}

#[tokio::test]
async fn test_driver_bad_photo_warns() {
    let workspace = Workspace::new();
    let camera_image = workspace.image("camera.png", 8, 8);
    let not_an_image = workspace.0.join("notes.txt");
    std::fs::write(&not_an_image, "just text").unwrap();

    let (mut driver, _messages) = driver(Arc::new(MemoryBackend::new()), &camera_image, None);
    let mut state = loaded_state(vec![storage_box("1", "Shoes")]);
    driver.dispatch(&mut state, Message::OpenBox("1".into())).await;
    driver
        .dispatch(&mut state, Message::ItemPhotoSelected(not_an_image))
        .await;

    assert!(state.detail.add_item.photo.is_none());
    assert!(!state.detail.add_item.compressing);
    assert_eq!(state.toast.as_ref().unwrap().message, "Could not read photo");
}

#[tokio::test]
async fn test_driver_scan_finds_box() {
    let workspace = Workspace::new();
    let camera_image = workspace.image("camera.png", 32, 32);
    let backend = Arc::new(MemoryBackend::new());
    let service = InventoryService::from_backend(Arc::clone(&backend));
    let created = service
        .create_box(boxtrack::inventory::NewBox::new("Cables"))
        .await
        .unwrap();

    let locator = format!("https://boxes.example/?box={}", created.id);
    let (mut driver, mut messages) = driver(
        Arc::clone(&backend),
        &camera_image,
        Some(Arc::new(Finds(locator))),
    );

    let mut state = AppState::new("https://boxes.example/");
    let loaded = driver.run(Effect::LoadBoxes).await.unwrap();
    driver.dispatch(&mut state, loaded).await;

    driver.dispatch(&mut state, Message::OpenScanner).await;
    assert!(state.scanner.open);
    assert!(driver.is_scanning());

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while state.scanner.open {
        let message = tokio::time::timeout_at(deadline, messages.recv())
            .await
            .expect("scan did not finish")
            .expect("driver dropped");
        driver.dispatch(&mut state, message).await;
    }

    assert_eq!(state.view, View::BoxDetail { box_id: created.id });
    assert_eq!(state.toast.as_ref().unwrap().message, "Found: Cables");
}

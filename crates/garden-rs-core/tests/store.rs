//! HTTP record store integration tests against the fake backend.

use garden_rs_config::GardenConfig;
use garden_rs_core::{ErrorKind, HttpRecordStore, NewRecord, RecordDraft, RecordStore, StoreError};
use garden_rs_protocol::{IconId, Position, RecordId};
use garden_rs_test_utils::{FakeBackend, Scripted, row};
use pretty_assertions::assert_eq;
use serde_json::json;

fn store_for(backend: &FakeBackend) -> HttpRecordStore {
    HttpRecordStore::new(backend.endpoint()).expect("store")
}

fn new_record() -> NewRecord {
    RecordDraft::at(Position::new(12.5, -7.25))
        .with_text("A", "B")
        .with_icon(IconId::Three)
        .validate()
        .expect("valid draft")
}

/// A created record lists back at the same position with the same icon.
#[tokio::test]
async fn created_record_round_trips() {
    let backend = FakeBackend::spawn().await;
    let store = store_for(&backend);

    let created = store.create_record(&new_record()).await.expect("create");
    let form = backend.last_form().expect("form");
    assert_eq!(form.get("lat").map(String::as_str), Some("12.5"));
    assert_eq!(form.get("lng").map(String::as_str), Some("-7.25"));
    assert_eq!(form.get("title").map(String::as_str), Some("A"));
    assert_eq!(form.get("body").map(String::as_str), Some("B"));
    assert_eq!(form.get("icon").map(String::as_str), Some("3"));
    assert_eq!(backend.rows()[0]["lat"], json!("12.5"));

    let listing = store.list_records().await.expect("list");
    assert_eq!(listing.records.len(), 1);
    let record = &listing.records[0];
    assert_eq!(record.position, Position::new(12.5, -7.25));
    assert_eq!(record.icon, IconId::Three);
    assert_eq!(record.title, "A");
    assert_eq!(record.body, "B");
    assert_eq!(Some(record.id.clone()), created.assigned_id);
}

/// A non-array listing is empty, not an error.
#[tokio::test]
async fn non_array_listing_is_empty() {
    let backend = FakeBackend::spawn().await;
    backend.script(Scripted::Json(json!({})));
    let listing = store_for(&backend).list_records().await.expect("list");
    assert!(listing.records.is_empty());
    assert_eq!(listing.skipped, 0);
}

/// Rows with unreadable coordinates are skipped, the rest still list.
#[tokio::test]
async fn listing_skips_bad_rows() {
    let backend = FakeBackend::with_rows(vec![
        row("2025-03-01T10:00:00.000Z", "48.85", "2.35", "2"),
        row("2025-03-02T10:00:00.000Z", "", "2.35", "2"),
        row("2025-03-03T10:00:00.000Z", "51.5", "-0.12", "9"),
    ])
    .await;
    let listing = store_for(&backend).list_records().await.expect("list");
    assert_eq!(listing.records.len(), 2);
    assert_eq!(listing.skipped, 1);
    assert_eq!(listing.records[1].icon, IconId::One);
}

/// Cells typed as numbers by the sheet read the same as text cells.
#[tokio::test]
async fn numeric_cells_are_read() {
    let backend = FakeBackend::spawn().await;
    backend.push_row(json!({
        "timestamp": "2025-03-01T10:00:00.000Z",
        "lat": 48.85,
        "lng": -2,
        "title": "Pier",
        "body": "",
        "icon": 5,
        "lastwatered": "",
    }));
    let listing = store_for(&backend).list_records().await.expect("list");
    assert_eq!(listing.records.len(), 1);
    let record = &listing.records[0];
    assert_eq!(record.position, Position::new(48.85, -2.0));
    assert_eq!(record.icon, IconId::Five);
    assert_eq!(record.last_watered, None);
}

/// Backend-reported failures surface the error string exactly.
#[tokio::test]
async fn backend_failure_surfaces_message() {
    let backend = FakeBackend::spawn().await;
    backend.script(Scripted::Json(json!({ "success": false, "error": "x" })));
    let err = store_for(&backend)
        .create_record(&new_record())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Backend);
    assert_eq!(err.to_string(), "x");
}

/// Non-success statuses are network errors.
#[tokio::test]
async fn error_status_is_network_error() {
    let backend = FakeBackend::spawn().await;
    backend.script(Scripted::Status(500));
    let err = store_for(&backend).list_records().await.unwrap_err();
    assert!(matches!(err, StoreError::Status(500)));
    assert_eq!(err.kind(), ErrorKind::Network);

    backend.script(Scripted::Status(503));
    let err = store_for(&backend)
        .water_record(&RecordId::new("2025-03-01T10:00:00.000Z"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}

/// A listing body that is not JSON at all is a network error.
#[tokio::test]
async fn unreadable_listing_is_network_error() {
    let backend = FakeBackend::spawn().await;
    backend.script(Scripted::Raw("<html>sign in</html>".to_string()));
    let err = store_for(&backend).list_records().await.unwrap_err();
    assert!(matches!(err, StoreError::Decode(_)));
    assert_eq!(err.kind(), ErrorKind::Network);
}

/// Unreachable endpoints are transport errors.
#[tokio::test]
async fn unreachable_endpoint_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let store = HttpRecordStore::new(format!("http://{addr}/exec")).expect("store");
    let err = store.list_records().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}

/// Watering sends the record timestamp as `uuid`.
#[tokio::test]
async fn water_posts_uuid() {
    let backend = FakeBackend::with_rows(vec![row("2025-03-01T10:00:00.000Z", "1", "2", "4")]).await;
    let store = store_for(&backend);
    let id = RecordId::new("2025-03-01T10:00:00.000Z");
    store.water_record(&id).await.expect("water");

    let form = backend.last_form().expect("form");
    assert_eq!(form.get("uuid").map(String::as_str), Some(id.as_str()));
    assert_eq!(form.len(), 1);

    let listing = store.list_records().await.expect("list");
    let record = &listing.records[0];
    assert!(record.last_watered.is_some());
    assert!(record.last_watered >= record.created_at);
}

/// Watering an unknown id reports the backend's message.
#[tokio::test]
async fn water_unknown_id_fails() {
    let backend = FakeBackend::spawn().await;
    let err = store_for(&backend)
        .water_record(&RecordId::new("nope"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Memory not found");
}

/// Invalid records are rejected without a request.
#[tokio::test]
async fn invalid_record_never_reaches_backend() {
    let backend = FakeBackend::spawn().await;
    let mut record = new_record();
    record.position = Position::new(f64::NAN, 1.0);
    let err = store_for(&backend).create_record(&record).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(backend.request_count(), 0);
}

/// Building from config requires an endpoint.
#[tokio::test]
async fn from_config_uses_endpoint() {
    let backend = FakeBackend::spawn().await;
    let config = GardenConfig::builder().endpoint(backend.endpoint()).build();
    let store = HttpRecordStore::from_config(&config).expect("store");
    assert_eq!(store.endpoint(), backend.endpoint());
    store.list_records().await.expect("list");
    assert_eq!(backend.get_count(), 1);
}

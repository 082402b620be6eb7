//! In-process fake of the spreadsheet endpoint.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use log::{debug, warn};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Path the fake endpoint is mounted at.
pub const ENDPOINT_PATH: &str = "/exec";

/// A canned response returned instead of the normal behaviour.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// `200 OK` with a JSON body.
    Json(Value),
    /// Empty body with the given status.
    Status(u16),
    /// `200 OK` with a raw text body.
    Raw(String),
}

impl IntoResponse for Scripted {
    fn into_response(self) -> Response {
        match self {
            Scripted::Json(value) => Json(value).into_response(),
            Scripted::Status(code) => StatusCode::from_u16(code)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
                .into_response(),
            Scripted::Raw(body) => ([(header::CONTENT_TYPE, "text/plain")], body).into_response(),
        }
    }
}

#[derive(Default)]
struct BackendState {
    rows: Mutex<Vec<Value>>,
    scripted: Mutex<VecDeque<Scripted>>,
    forms: Mutex<Vec<HashMap<String, String>>>,
    last_timestamp: Mutex<Option<DateTime<Utc>>>,
    gets: AtomicUsize,
    posts: AtomicUsize,
}

impl BackendState {
    fn next_scripted(&self) -> Option<Scripted> {
        self.scripted.lock().pop_front()
    }

    /// Strictly increasing timestamps so ids never collide.
    fn next_timestamp(&self) -> String {
        let mut last = self.last_timestamp.lock();
        let mut now = Utc::now();
        if let Some(previous) = *last
            && now <= previous
        {
            now = previous + Duration::milliseconds(1);
        }
        *last = Some(now);
        now.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn create(&self, form: &HashMap<String, String>) -> Value {
        let timestamp = self.next_timestamp();
        let field = |name: &str| form.get(name).cloned().unwrap_or_default();
        self.rows.lock().push(json!({
            "timestamp": timestamp,
            "lat": field("lat"),
            "lng": field("lng"),
            "title": field("title"),
            "body": field("body"),
            "icon": field("icon"),
        }));
        json!({ "success": true, "lastwatered": timestamp })
    }

    fn water(&self, uuid: &str) -> Value {
        let watered = self.next_timestamp();
        let mut rows = self.rows.lock();
        let row = rows
            .iter_mut()
            .find(|row| row.get("timestamp").and_then(Value::as_str) == Some(uuid));
        match row {
            Some(Value::Object(row)) => {
                row.insert("lastwatered".to_string(), Value::String(watered.clone()));
                json!({ "success": true, "lastwatered": watered })
            }
            _ => json!({ "success": false, "error": "Memory not found" }),
        }
    }
}

async fn list(State(state): State<Arc<BackendState>>) -> Response {
    state.gets.fetch_add(1, Ordering::SeqCst);
    if let Some(scripted) = state.next_scripted() {
        return scripted.into_response();
    }
    Json(Value::Array(state.rows.lock().clone())).into_response()
}

async fn submit(
    State(state): State<Arc<BackendState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.posts.fetch_add(1, Ordering::SeqCst);
    state.forms.lock().push(form.clone());
    if let Some(scripted) = state.next_scripted() {
        return scripted.into_response();
    }
    let reply = match form.get("uuid") {
        Some(uuid) => state.water(uuid),
        None => state.create(&form),
    };
    Json(reply).into_response()
}

/// Fake backend listening on a random local port.
///
/// Speaks the same wire format as the real endpoint: `GET` lists rows,
/// form `POST`s create (`lat, lng, title, body, icon`) or water (`uuid`).
/// The server stops when the value is dropped.
pub struct FakeBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
    server: JoinHandle<()>,
}

impl FakeBackend {
    /// Start an empty backend.
    pub async fn spawn() -> Self {
        let state = Arc::new(BackendState::default());
        let app = Router::new()
            .route(ENDPOINT_PATH, get(list).post(submit))
            .with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend addr");
        let server = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                warn!("fake backend stopped (error={err})");
            }
        });
        debug!("fake backend listening (addr={addr})");
        Self {
            addr,
            state,
            server,
        }
    }

    /// Start a backend pre-seeded with listing rows.
    pub async fn with_rows(rows: Vec<Value>) -> Self {
        let backend = Self::spawn().await;
        backend.state.rows.lock().extend(rows);
        backend
    }

    /// URL to point a store at.
    pub fn endpoint(&self) -> String {
        format!("http://{}{}", self.addr, ENDPOINT_PATH)
    }

    /// Append a raw listing row.
    pub fn push_row(&self, row: Value) {
        self.state.rows.lock().push(row);
    }

    /// Current rows as the backend stores them.
    pub fn rows(&self) -> Vec<Value> {
        self.state.rows.lock().clone()
    }

    /// Answer the next request with a canned response.
    pub fn script(&self, response: Scripted) {
        self.state.scripted.lock().push_back(response);
    }

    pub fn get_count(&self) -> usize {
        self.state.gets.load(Ordering::SeqCst)
    }

    pub fn post_count(&self) -> usize {
        self.state.posts.load(Ordering::SeqCst)
    }

    pub fn request_count(&self) -> usize {
        self.get_count() + self.post_count()
    }

    /// Fields of the most recent form `POST`.
    pub fn last_form(&self) -> Option<HashMap<String, String>> {
        self.state.forms.lock().last().cloned()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

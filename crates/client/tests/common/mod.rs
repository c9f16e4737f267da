//! In-process mock of the ScanFlow server used by the integration tests.
//!
//! Serves the `/api/v1` REST endpoints and the `/api/v1/ws` push channel
//! from an axum router bound to `127.0.0.1:0`, recording every request
//! so tests can assert on paths, headers and bodies.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::ws::{Message, WebSocketUpgrade};
use axum::extract::{Path, Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use scanflow_client::api::{ScanFlowApi, REQUEST_ID_HEADER};

/// One request as seen by the mock server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
}

/// Behaviour knobs and recorded traffic of the mock server.
#[derive(Default)]
pub struct MockState {
    /// When set, every request must carry this key.
    pub api_key: Option<String>,
    /// Answer `/status` with a body that is not JSON.
    pub garbage_status: bool,
    /// Successive statuses returned by `GET /scan/{id}`; the last one sticks.
    pub job_statuses: Mutex<VecDeque<String>>,
    /// Text frames sent to every push-channel client before closing.
    pub ws_frames: Vec<String>,
    pub ws_connections: AtomicUsize,
    pub requests: Mutex<Vec<RecordedRequest>>,
    pub scan_bodies: Mutex<Vec<Value>>,
    pub finish_bodies: Mutex<Vec<Value>>,
}

impl MockState {
    pub fn with_job_statuses(mut self, statuses: &[&str]) -> Self {
        self.job_statuses = Mutex::new(statuses.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_ws_frames(mut self, frames: &[&str]) -> Self {
        self.ws_frames = frames.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.recorded()
            .into_iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }
}

/// A running mock server.
pub struct MockBackend {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start(state: MockState) -> Self {
        let state = Arc::new(state);
        let app = router(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn api(&self) -> ScanFlowApi {
        ScanFlowApi::new(&self.base_url(), self.state.api_key.clone()).unwrap()
    }
}

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/status", get(status))
        .route("/api/v1/scanner/devices", get(devices))
        .route("/api/v1/profiles", get(profiles))
        .route("/api/v1/profiles/{name}", get(profile))
        .route("/api/v1/outputs", get(outputs))
        .route("/api/v1/scan", post(start_scan))
        .route("/api/v1/scan/{id}", get(get_job).delete(cancel_job))
        .route("/api/v1/scan/{id}/continue", post(ok))
        .route("/api/v1/scan/{id}/finish", post(finish))
        .route("/api/v1/scan/{id}/pages/{page}", delete(ok))
        .route("/api/v1/ws", get(ws))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), record))
        .with_state(state)
}

async fn record(State(state): State<Arc<MockState>>, req: Request, next: Next) -> Response {
    let headers = req.headers().clone();
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let authorization = header(AUTHORIZATION.as_str());
    let query_key = req.uri().query().and_then(|q| {
        q.split('&')
            .find_map(|pair| pair.strip_prefix("api_key="))
            .map(str::to_string)
    });

    state.requests.lock().unwrap().push(RecordedRequest {
        method: req.method().to_string(),
        path: req.uri().path().to_string(),
        authorization: authorization.clone(),
        request_id: header(REQUEST_ID_HEADER),
    });

    if let Some(key) = &state.api_key {
        let bearer_ok = authorization.as_deref() == Some(format!("Bearer {key}").as_str());
        let query_ok = query_key.as_deref() == Some(key.as_str());
        if !bearer_ok && !query_ok {
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"})))
                .into_response();
        }
    }

    next.run(req).await
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "version": "0.1.0"}))
}

async fn status(State(state): State<Arc<MockState>>) -> Response {
    if state.garbage_status {
        return "<html>maintenance</html>".into_response();
    }
    Json(json!({
        "status": "ok",
        "version": "0.1.0",
        "scanner": true,
        "devices": 2,
        "active_jobs": 1,
        "total_jobs": 7
    }))
    .into_response()
}

async fn devices() -> Json<Value> {
    Json(json!({"devices": [
        {"name": "escl:http://10.0.0.5", "vendor": "Brother", "model": "ADS-1700W", "type": "sheetfed"},
        {"name": "fujitsu:fi-7160:1", "vendor": "Fujitsu", "model": "fi-7160", "type": "sheetfed"}
    ]}))
}

async fn profiles() -> Json<Value> {
    Json(json!({"profiles": [
        {"profile": {"name": "standard", "description": "300 DPI grey duplex"},
         "scanner": {"resolution": 300, "mode": "Gray", "source": "ADF Duplex", "page_height": 297.0}},
        {"profile": {"name": "photo", "description": "600 DPI colour"}}
    ]}))
}

async fn profile(Path(name): Path<String>) -> Response {
    if name == "standard" {
        Json(json!({"profile": {"name": "standard", "description": "300 DPI grey duplex"},
                    "scanner": {"resolution": 300, "mode": "Gray"}}))
        .into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({"error": "profile not found"}))).into_response()
    }
}

async fn outputs() -> Json<Value> {
    Json(json!({"outputs": [
        {"name": "paperless", "type": "paperless", "enabled": true, "available": true},
        {"name": "smb", "type": "smb", "enabled": false, "available": false}
    ]}))
}

async fn start_scan(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.scan_bodies.lock().unwrap().push(body.clone());

    let profile = body["profile"].as_str().unwrap_or("standard").to_string();
    if profile == "broken" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "unknown profile: broken"})),
        )
            .into_response();
    }

    (
        StatusCode::ACCEPTED,
        Json(json!({
            "id": "f47ac10b-58cc-4372-a567-0e02b2c3d479",
            "status": "pending",
            "profile": profile,
            "pages": [],
            "progress": 0,
            "output": body.get("output").cloned().unwrap_or(json!({"target": "paperless"})),
            "created_at": "2026-01-05T10:00:00Z",
            "updated_at": "2026-01-05T10:00:00Z"
        })),
    )
        .into_response()
}

async fn get_job(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Response {
    let status = {
        let mut statuses = state.job_statuses.lock().unwrap();
        if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        }
    };
    let Some(status) = status else {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "job not found"}))).into_response();
    };

    let (pages, progress, error) = match status.as_str() {
        "completed" => (json!([{"number": 1}, {"number": 2}]), 100, Value::Null),
        "failed" => (json!([]), 0, json!("paper jam")),
        "scanning" => (json!([{"number": 1}]), 50, Value::Null),
        _ => (json!([]), 0, Value::Null),
    };

    let mut job = json!({
        "id": id,
        "status": status,
        "profile": "standard",
        "pages": pages,
        "progress": progress
    });
    if !error.is_null() {
        job["error"] = error;
    }
    Json(job).into_response()
}

async fn cancel_job() -> Json<Value> {
    Json(json!({"status": "cancelled"}))
}

async fn finish(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Json<Value> {
    state.finish_bodies.lock().unwrap().push(body);
    Json(json!({"status": "processing"}))
}

async fn ok() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn ws(
    State(state): State<Arc<MockState>>,
    Query(_params): Query<HashMap<String, String>>,
    upgrade: WebSocketUpgrade,
) -> Response {
    state.ws_connections.fetch_add(1, Ordering::SeqCst);
    let frames = state.ws_frames.clone();
    upgrade.on_upgrade(move |mut socket| async move {
        for frame in frames {
            if socket.send(Message::Text(frame.into())).await.is_err() {
                return;
            }
        }
        let _ = socket.send(Message::Close(None)).await;
    })
}

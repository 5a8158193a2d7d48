use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use admitdesk::router::init_router;
use admitdesk::state::AppState;
use admitdesk_config::UploadConfig;
use admitdesk_core::file_storage::LocalFileStorage;
use admitdesk_observability::{RecordingTelemetry, Telemetry};
use admitdesk_store::MemoryStore;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub store: Arc<MemoryStore>,
    pub telemetry: RecordingTelemetry,
    pub upload_dir: PathBuf,
}

/// Fresh in-memory app with documents written under a unique temp dir.
pub fn setup_test_app() -> TestApp {
    let upload_dir = std::env::temp_dir().join(format!(
        "admitdesk-it-{}-{}",
        std::process::id(),
        rand::random::<u64>()
    ));
    let upload_config = UploadConfig {
        dir: upload_dir.clone(),
        ..UploadConfig::default()
    };

    let store = Arc::new(MemoryStore::new());
    let telemetry = RecordingTelemetry::new();
    let files = Arc::new(LocalFileStorage::with_max_size(
        upload_config.dir.clone(),
        upload_config.base_url.clone(),
        upload_config.max_bytes,
    ));

    let mut state = AppState::new(
        store.clone(),
        Arc::new(telemetry.clone()) as Arc<dyn Telemetry>,
        files,
        Duration::from_secs(5),
    );
    state.upload_config = upload_config;

    TestApp {
        router: init_router(state),
        store,
        telemetry,
        upload_dir,
    }
}

#[allow(dead_code)]
pub async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    read_json(response).await
}

#[allow(dead_code)]
pub async fn send_raw(
    app: &axum::Router,
    method: &str,
    uri: &str,
    bytes: Vec<u8>,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/octet-stream")
        .body(Body::from(bytes))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    read_json(response).await
}

async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

/// Response body of an open event stream plus unconsumed bytes.
#[allow(dead_code)]
pub struct EventReader {
    body: Body,
    buffer: String,
}

/// Opens an event stream; the body is only returned on success.
#[allow(dead_code)]
pub async fn open_events(app: &axum::Router, uri: &str) -> (StatusCode, Option<EventReader>) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header("accept", "text/event-stream")
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    if !status.is_success() {
        return (status, None);
    }
    assert_eq!(
        response.headers()["content-type"],
        "text/event-stream"
    );
    (
        status,
        Some(EventReader {
            body: response.into_body(),
            buffer: String::new(),
        }),
    )
}

impl EventReader {
    /// Next named event and its JSON data, skipping keep-alive comments.
    #[allow(dead_code)]
    pub async fn next(&mut self) -> (String, Value) {
        loop {
            if let Some(end) = self.buffer.find("\n\n") {
                let block: String = self.buffer.drain(..end + 2).collect();
                let mut name = String::from("message");
                let mut data = String::new();
                for line in block.lines() {
                    if let Some(rest) = line.strip_prefix("event:") {
                        name = rest.trim().to_string();
                    } else if let Some(rest) = line.strip_prefix("data:") {
                        data.push_str(rest.trim_start());
                    }
                }
                if data.is_empty() {
                    continue;
                }
                return (name, serde_json::from_str(&data).unwrap());
            }

            let frame = tokio::time::timeout(Duration::from_secs(2), self.body.frame())
                .await
                .expect("timed out waiting for event")
                .expect("stream ended")
                .unwrap();
            if let Ok(bytes) = frame.into_data() {
                self.buffer.push_str(&String::from_utf8_lossy(&bytes));
            }
        }
    }
}

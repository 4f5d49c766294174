//! Shared test infrastructure
//!
//! Spins up one axum server that plays all three external collaborators
//! (identity provider, object storage, moment backend) on a random port,
//! records every call it receives, and exposes fault-injection toggles
//! for the failure scenarios.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{post, put};
use bytes::Bytes;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use momentcast::AppState;
use momentcast::auth::{Session, SessionTokenSource};
use momentcast::config::{
    AccountConfig, AppConfig, EndpointsConfig, LoggingConfig, MediaConfig, UploadConfig,
};
use momentcast::data::{Draft, MediaAsset, MediaKind, ProgressEvent};
use momentcast::error::{AppError, Result as PipelineResult};
use momentcast::media::Thumbnailer;
use momentcast::service::{ChannelProgressSink, UploadOrchestrator};

/// One recorded upload-session start request
pub struct RecordedStart {
    pub bucket: String,
    pub object: String,
    pub authorization: String,
    pub command: String,
    pub content_length: String,
    pub storage_version: String,
    pub body: Value,
}

/// One recorded payload transfer (PUT to a session URL)
pub struct RecordedTransfer {
    pub session: String,
    pub authorization: String,
    pub command: String,
    pub offset: String,
    pub content_type: String,
    pub byte_length: usize,
}

/// One recorded moment registration
pub struct RecordedRegistration {
    pub authorization: String,
    pub body: Value,
}

/// Shared state of the mock backend
#[derive(Default)]
pub struct BackendState {
    addr: OnceLock<String>,

    /// Ordered log of every call, e.g. `["start:<path>", "transfer:3"]`
    pub calls: Mutex<Vec<String>>,
    pub starts: Mutex<Vec<RecordedStart>>,
    pub transfers: Mutex<Vec<RecordedTransfer>>,
    pub registrations: Mutex<Vec<RecordedRegistration>>,
    pub login_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    session_counter: AtomicUsize,

    // Fault injection. A status of 0 means "succeed".
    pub login_status: AtomicU16,
    pub start_status: AtomicU16,
    pub register_status: AtomicU16,
    pub omit_session_header: AtomicBool,
}

impl BackendState {
    fn addr(&self) -> &str {
        self.addr.get().map(String::as_str).unwrap_or_default()
    }

    fn log(&self, entry: String) {
        self.calls.lock().unwrap().push(entry);
    }

    pub fn call_log(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

/// All three collaborators behind one listener
pub struct MockBackend {
    pub addr: String,
    pub state: Arc<BackendState>,
}

impl MockBackend {
    pub async fn spawn() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = format!("http://{}", listener.local_addr().unwrap());

        let state = Arc::new(BackendState::default());
        state.addr.set(addr.clone()).unwrap();

        let app = Router::new()
            .route("/identity/verifyPassword", post(verify_password))
            .route("/identity/getAccountInfo", post(get_account_info))
            .route("/token", post(refresh_token))
            .route(
                "/v0/b/:bucket/o/:object",
                post(start_upload).get(resolve_object),
            )
            .route("/upload/:session", put(transfer_payload))
            .route("/postMomentV2", post(register_moment))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve mock backend");
        });

        Self { addr, state }
    }

    /// Pipeline configuration pointing every endpoint at this backend
    pub fn config(&self) -> AppConfig {
        AppConfig {
            endpoints: EndpointsConfig {
                identity_url: format!("{}/identity", self.addr),
                token_url: self.addr.clone(),
                storage_url: format!("{}/v0", self.addr),
                api_url: self.addr.clone(),
                api_key: "test-key".to_string(),
            },
            account: AccountConfig {
                email: "user@example.com".to_string(),
                password: "hunter2!".to_string(),
            },
            upload: UploadConfig {
                max_dimension: 1020,
                jpeg_quality: 90,
                image_bucket: "moments-img".to_string(),
                video_bucket: "moments-video".to_string(),
            },
            media: MediaConfig {
                ffmpeg_path: "ffmpeg".to_string(),
                ffprobe_path: "ffprobe".to_string(),
                thumbnail_offset_seconds: 1.0,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

fn header(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn error_body(status: u16, message: &str) -> Response {
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(json!({ "error": { "message": message } })),
    )
        .into_response()
}

async fn verify_password(
    State(state): State<Arc<BackendState>>,
    Json(_body): Json<Value>,
) -> Response {
    state.log("login".to_string());
    state.login_calls.fetch_add(1, Ordering::SeqCst);

    let status = state.login_status.load(Ordering::SeqCst);
    if status != 0 {
        return error_body(status, "INVALID_PASSWORD");
    }

    Json(json!({
        "idToken": "token-1",
        "refreshToken": "refresh-1",
        "localId": "owner-1",
        "expiresIn": "3600",
    }))
    .into_response()
}

async fn get_account_info(
    State(state): State<Arc<BackendState>>,
    Json(_body): Json<Value>,
) -> Response {
    state.log("account_info".to_string());
    Json(json!({
        "users": [{
            "localId": "owner-1",
            "email": "user@example.com",
            "displayName": "Test User",
        }],
    }))
    .into_response()
}

async fn refresh_token(
    State(state): State<Arc<BackendState>>,
    Json(_body): Json<Value>,
) -> Response {
    state.log("refresh".to_string());
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "access_token": "token-2",
        "refresh_token": "refresh-2",
        "expires_in": "3600",
    }))
    .into_response()
}

async fn start_upload(
    State(state): State<Arc<BackendState>>,
    Path((bucket, object)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.log(format!("start:{}", object));
    state.starts.lock().unwrap().push(RecordedStart {
        bucket,
        object,
        authorization: header(&headers, "authorization"),
        command: header(&headers, "x-goog-upload-command"),
        content_length: header(&headers, "x-goog-upload-content-length"),
        storage_version: header(&headers, "x-firebase-storage-version"),
        body,
    });

    let status = state.start_status.load(Ordering::SeqCst);
    if status != 0 {
        return error_body(status, "storage rejected the request");
    }

    if state.omit_session_header.load(Ordering::SeqCst) {
        return Json(json!({})).into_response();
    }

    let session = state.session_counter.fetch_add(1, Ordering::SeqCst) + 1;
    let session_url = format!("{}/upload/{}", state.addr(), session);
    ([("x-goog-upload-url", session_url)], Json(json!({}))).into_response()
}

async fn transfer_payload(
    State(state): State<Arc<BackendState>>,
    Path(session): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.log(format!("transfer:{}", session));
    state.transfers.lock().unwrap().push(RecordedTransfer {
        session,
        authorization: header(&headers, "authorization"),
        command: header(&headers, "x-goog-upload-command"),
        offset: header(&headers, "x-goog-upload-offset"),
        content_type: header(&headers, "content-type"),
        byte_length: body.len(),
    });
    Json(json!({})).into_response()
}

async fn resolve_object(
    State(state): State<Arc<BackendState>>,
    Path((_bucket, object)): Path<(String, String)>,
) -> Response {
    state.log(format!("resolve:{}", object));
    Json(json!({ "downloadTokens": "dl-token" })).into_response()
}

async fn register_moment(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.log("register".to_string());
    state.registrations.lock().unwrap().push(RecordedRegistration {
        authorization: header(&headers, "authorization"),
        body,
    });

    let status = state.register_status.load(Ordering::SeqCst);
    if status != 0 {
        return error_body(status, "Unauthenticated request");
    }

    Json(json!({ "result": { "data": { "id": "moment-123" } } })).into_response()
}

/// A backend plus an app wired against it with a live session
pub struct Harness {
    pub backend: MockBackend,
    pub app: AppState,
    pub tokens: Arc<SessionTokenSource>,
}

pub async fn harness() -> Harness {
    let backend = MockBackend::spawn().await;
    let app = AppState::new(backend.config()).expect("app state");
    let session = Session::new(
        "token-1".to_string(),
        "refresh-1".to_string(),
        "owner-1".to_string(),
        3600,
    );
    let tokens = Arc::new(SessionTokenSource::new(app.identity.clone(), Some(session)));
    Harness {
        backend,
        app,
        tokens,
    }
}

impl Harness {
    pub fn orchestrator(
        &self,
        thumbnailer: Arc<dyn Thumbnailer>,
    ) -> (UploadOrchestrator, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (sink, rx) = ChannelProgressSink::new();
        let orchestrator =
            self.app
                .orchestrator_with_thumbnailer(self.tokens.clone(), Arc::new(sink), thumbnailer);
        (orchestrator, rx)
    }
}

/// Encode a synthetic JPEG at the given dimensions
pub fn jpeg_bytes(width: u32, height: u32) -> Bytes {
    let gradient = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 120])
    });
    let mut buffer = std::io::Cursor::new(Vec::new());
    gradient
        .write_to(&mut buffer, image::ImageFormat::Jpeg)
        .expect("encode test image");
    Bytes::from(buffer.into_inner())
}

pub fn image_draft(caption: &str, recipients: Vec<String>) -> Draft {
    Draft {
        asset: MediaAsset::new(jpeg_bytes(2040, 1530), MediaKind::Image, "photo.jpg"),
        caption: caption.to_string(),
        recipients,
    }
}

pub fn video_draft(caption: &str, recipients: Vec<String>) -> Draft {
    // The pipeline never decodes the video payload, so any bytes do.
    Draft {
        asset: MediaAsset::new(b"ftypisom-fake-video-payload".to_vec(), MediaKind::Video, "clip.mp4"),
        caption: caption.to_string(),
        recipients,
    }
}

/// Thumbnailer double returning a fixed encoded frame
pub struct StaticThumbnailer {
    frame: Bytes,
}

impl StaticThumbnailer {
    pub fn new() -> Self {
        Self {
            frame: jpeg_bytes(640, 360),
        }
    }
}

#[async_trait]
impl Thumbnailer for StaticThumbnailer {
    async fn extract_frame(&self, _video: &[u8], _offset_seconds: f64) -> PipelineResult<Bytes> {
        Ok(self.frame.clone())
    }
}

/// Thumbnailer double that always fails to decode
pub struct FailingThumbnailer;

#[async_trait]
impl Thumbnailer for FailingThumbnailer {
    async fn extract_frame(&self, _video: &[u8], _offset_seconds: f64) -> PipelineResult<Bytes> {
        Err(AppError::MediaDecode(
            "no decodable video stream".to_string(),
        ))
    }
}

/// Drain every progress event already delivered to the receiver
pub fn drain_events(rx: &mut mpsc::UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

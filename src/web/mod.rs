//! Browser front end: a single page plus a small JSON/NDJSON API.
//!
//! ## Routes
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /`              | the page |
//! | `GET /api/models`    | model selector options |
//! | `POST /api/analyze`  | multipart form in, NDJSON [`AnalysisEvent`] lines out |
//! | `GET /api/history`   | this session's analyses, most recent first |
//! | `DELETE /api/history`| forget this session's analyses |
//!
//! Each analysis runs on its own task and records its result in the
//! session history even if the browser disconnects before it finishes.
//!
//! Progress reaches the browser as one JSON object per line while the
//! analysis runs, so the page can move its progress bar on every poll tick
//! without a second connection.

pub mod session;

use crate::config::AnalysisConfig;
use crate::history::HistoryEntry;
use crate::pipeline::source::is_youtube_url;
use crate::prompts::{DEFAULT_MODEL, DEFAULT_PROMPT, SUPPORTED_MODELS};
use crate::stream::{analyze_events, AnalysisEvent, AnalysisInput};
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures::StreamExt;
use serde::Serialize;
use session::{new_session_id, session_cookie, session_from_headers, SessionStore};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc::unbounded_channel;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Default request body cap, matching a typical 200 MB upload limit.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Shared state for all handlers.
pub struct AppState {
    /// Template every request's config is cloned from (poll interval,
    /// timeouts, an injected service in tests).
    pub base_config: AnalysisConfig,
    pub sessions: SessionStore,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(base_config: AnalysisConfig, max_upload_bytes: usize) -> Arc<Self> {
        Self::with_sessions(base_config, max_upload_bytes, SessionStore::new())
    }

    /// State with an explicitly sized session store.
    pub fn with_sessions(
        base_config: AnalysisConfig,
        max_upload_bytes: usize,
        sessions: SessionStore,
    ) -> Arc<Self> {
        Arc::new(Self {
            base_config,
            sessions,
            max_upload_bytes,
        })
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let limit = state.max_upload_bytes;
    Router::new()
        .route("/", get(index_handler))
        .route("/api/models", get(models_handler))
        .route(
            "/api/analyze",
            axum::routing::post(analyze_handler).layer(DefaultBodyLimit::max(limit)),
        )
        .route("/api/history", get(history_handler).delete(clear_history_handler))
        .with_state(state)
}

type ApiError = (StatusCode, Json<ErrorBody>);

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

fn bad_request(msg: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody { error: msg.into() }),
    )
}

async fn index_handler() -> impl IntoResponse {
    Html(INDEX_HTML)
}

#[derive(Serialize)]
struct ModelsResponse {
    models: &'static [&'static str],
    default_model: &'static str,
    default_prompt: &'static str,
}

async fn models_handler() -> impl IntoResponse {
    Json(ModelsResponse {
        models: &SUPPORTED_MODELS,
        default_model: DEFAULT_MODEL,
        default_prompt: DEFAULT_PROMPT,
    })
}

#[derive(Serialize)]
struct HistoryItem {
    file_name: String,
    prompt: String,
    prompt_preview: String,
    text: String,
    total_cost: f64,
}

impl From<HistoryEntry> for HistoryItem {
    fn from(e: HistoryEntry) -> Self {
        Self {
            prompt_preview: e.prompt_preview(),
            file_name: e.file_name,
            prompt: e.prompt,
            text: e.text,
            total_cost: e.total_cost,
        }
    }
}

#[derive(Serialize)]
struct HistoryResponse {
    count: usize,
    items: Vec<HistoryItem>,
}

async fn history_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let (session, is_new) = session_for(&headers);
    let items: Vec<HistoryItem> = state
        .sessions
        .recent(&session)
        .await
        .into_iter()
        .map(HistoryItem::from)
        .collect();
    let body = Json(HistoryResponse {
        count: items.len(),
        items,
    });
    with_session_cookie(body.into_response(), &session, is_new)
}

async fn clear_history_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> StatusCode {
    if let Some(session) = session_from_headers(&headers) {
        state.sessions.clear(&session).await;
    }
    StatusCode::NO_CONTENT
}

/// Fields collected from the analyze form.
#[derive(Debug, Default)]
struct AnalyzeForm {
    api_key: Option<String>,
    model: Option<String>,
    prompt: Option<String>,
    url: Option<String>,
    file: Option<(String, Vec<u8>)>,
}

async fn read_form(mut multipart: Multipart) -> Result<AnalyzeForm, ApiError> {
    let mut form = AnalyzeForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("upload.mp4").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| bad_request(format!("Failed to read upload: {e}")))?;
            if !bytes.is_empty() {
                form.file = Some((file_name, bytes.to_vec()));
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| bad_request(format!("Failed to read field '{name}': {e}")))?;
        let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
        match name.as_str() {
            "api_key" => form.api_key = value,
            "model" => form.model = value,
            "prompt" => form.prompt = value,
            "url" => form.url = value,
            _ => {}
        }
    }
    Ok(form)
}

async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = read_form(multipart).await?;
    let (session, is_new) = session_for(&headers);

    // ── Map the form onto a config ───────────────────────────────────────
    let mut config = state.base_config.clone();
    if let Some(key) = form.api_key {
        config.api_key = Some(key);
    }
    if let Some(model) = form.model {
        if !SUPPORTED_MODELS.contains(&model.as_str()) {
            return Err(bad_request(format!("Unsupported model '{model}'")));
        }
        config.model = model;
    }
    config.prompt = form.prompt.unwrap_or_else(|| DEFAULT_PROMPT.to_string());

    // ── Pick the video: uploaded file wins over a link ───────────────────
    let (input, label) = match (form.file, form.url) {
        (Some((file_name, bytes)), _) => {
            info!("Browser upload: {} ({} bytes)", file_name, bytes.len());
            let label = file_name.clone();
            (AnalysisInput::Upload { bytes, file_name }, label)
        }
        (None, Some(url)) => {
            // Anything else would be read as a path on this machine.
            if !is_youtube_url(&url) {
                return Err(bad_request("Only YouTube links can be analyzed by URL"));
            }
            (AnalysisInput::Source(url.clone()), url)
        }
        (None, None) => return Err(bad_request("Please upload a video file or enter a YouTube link first.")),
    };

    // ── Run on its own task so a dropped connection still records ────────
    let prompt = config.prompt.clone();
    let (tx, rx) = unbounded_channel();
    let record_state = Arc::clone(&state);
    let record_session = session.clone();
    tokio::spawn(async move {
        let mut events = analyze_events(input, config);
        while let Some(event) = events.next().await {
            match &event {
                AnalysisEvent::Completed { result } => {
                    record_state
                        .sessions
                        .record(&record_session, &label, &prompt, result)
                        .await;
                }
                AnalysisEvent::Failed { message, .. } => warn!("Analysis failed: {}", message),
                _ => {}
            }
            if tx.send(event).is_err() {
                debug!("Client went away; analysis continues");
            }
        }
    });
    let lines = UnboundedReceiverStream::new(rx).map(|event| Ok::<_, Infallible>(ndjson_line(&event)));

    let mut response = Response::new(Body::from_stream(lines));
    let h = response.headers_mut();
    h.insert(CONTENT_TYPE, HeaderValue::from_static("application/x-ndjson"));
    h.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    Ok(with_session_cookie(response, &session, is_new))
}

/// One event as a JSON line.
pub fn ndjson_line(event: &AnalysisEvent) -> String {
    let mut line = serde_json::to_string(event).unwrap_or_else(|e| {
        format!(r#"{{"event":"failed","message":"unserialisable event: {e}","input_error":false}}"#)
    });
    line.push('\n');
    line
}

fn session_for(headers: &HeaderMap) -> (String, bool) {
    match session_from_headers(headers) {
        Some(id) => (id, false),
        None => (new_session_id(), true),
    }
}

fn with_session_cookie(mut response: Response, session: &str, is_new: bool) -> Response {
    if is_new {
        if let Ok(v) = HeaderValue::from_str(&session_cookie(session)) {
            response.headers_mut().insert(SET_COOKIE, v);
        }
    }
    response
}

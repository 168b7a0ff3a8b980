//! REST endpoints for analysis, PDF export, voice, and realtime sessions.

use std::path::Path;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        DefaultBodyLimit, Multipart, State, multipart::MultipartRejection, rejection::JsonRejection,
    },
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use super::error::ApiError;
use crate::cards::{Run, latest_run, normalize};
use crate::config::AppConfig;
use crate::llm::prompts::{REALTIME_INSTRUCTIONS, VOICE_SYSTEM_PROMPT, with_site_context};
use crate::llm::{ChatMessage, ChatResponder, Collaborators, SessionBroker, SessionRequest, VisionAnalyzer};
use crate::report::{ReportLayout, render, render_onto_template};
use crate::store::RunStore;

/// Multipart field carrying the site photo.
pub const SNAPSHOT_FIELD: &str = "snapshot";

/// Assumed when the upload does not say which image type it is.
const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<RunStore>,
    pub layout: ReportLayout,
    pub vision: Arc<dyn VisionAnalyzer>,
    pub chat: Arc<dyn ChatResponder>,
    pub sessions: Arc<dyn SessionBroker>,
}

impl AppState {
    pub fn new(config: AppConfig, collaborators: Collaborators) -> Self {
        let store = Arc::new(RunStore::new(config.history_path.clone()));
        Self {
            config: Arc::new(config),
            store,
            layout: ReportLayout::default(),
            vision: collaborators.vision,
            chat: collaborators.chat,
            sessions: collaborators.sessions,
        }
    }

    async fn latest_run(&self) -> Run {
        let history = self.store.load_history().await;
        latest_run(&history, &self.config.stub_run).clone()
    }
}

/// Build the Axum router with the API routes and the static frontend.
pub fn api_routes(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/api/analysis", get(get_analysis).post(post_analysis))
        .route("/api/export-pdf", get(export_pdf))
        .route("/api/call", post(simulate_call))
        .route("/api/voice", post(voice_reply))
        .route("/session", get(create_session))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "site-analyst"
    }))
}

// ── Analysis ────────────────────────────────────────────────────────────

async fn get_analysis(State(state): State<AppState>) -> Json<Run> {
    Json(state.config.stub_run.clone())
}

struct Snapshot {
    bytes: Bytes,
    mime_type: String,
}

async fn post_analysis(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Run>, ApiError> {
    let snapshot = match multipart {
        Ok(multipart) => read_snapshot(multipart).await?,
        Err(rejection) => {
            debug!(error = %rejection, "Analysis request is not multipart");
            None
        }
    };

    let Some(snapshot) = snapshot else {
        info!("No snapshot in analysis request, returning stub cards");
        return Ok(Json(state.config.stub_run.clone()));
    };

    let raw = state
        .vision
        .analyze(&snapshot.bytes, &snapshot.mime_type)
        .await
        .map_err(|e| ApiError::upstream("Image analysis failed", e))?;

    let cards = normalize(&raw);
    if let Err(e) = state.store.append_run(&cards).await {
        error!(error = %e, "Failed to persist analysis run");
    }

    info!(cards = cards.len(), "Snapshot analyzed");
    Ok(Json(cards))
}

/// Pull the first `snapshot` field out of a multipart body. An empty one counts as missing.
///
/// A body that cannot be read (truncated, malformed, over the upload limit)
/// is an error, not a missing snapshot.
async fn read_snapshot(mut multipart: Multipart) -> Result<Option<Snapshot>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(ApiError::Upload)? {
        if field.name() != Some(SNAPSHOT_FIELD) {
            continue;
        }

        let mime_type = field
            .content_type()
            .filter(|m| m.starts_with("image/"))
            .unwrap_or(DEFAULT_IMAGE_MIME)
            .to_string();

        let bytes = field.bytes().await.map_err(ApiError::Upload)?;
        if bytes.is_empty() {
            debug!("Snapshot field is empty");
            return Ok(None);
        }
        return Ok(Some(Snapshot { bytes, mime_type }));
    }
    Ok(None)
}

// ── PDF export ──────────────────────────────────────────────────────────

async fn export_pdf(State(state): State<AppState>) -> Result<Response, ApiError> {
    let cards = state.latest_run().await;
    let pages = state.layout.compose(&cards);

    let pdf = match read_template(&state.config.template_path).await {
        Some(template) => {
            match render_onto_template(&template, &pages, state.config.merge_mode) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(error = %e, "Template merge failed, rendering standalone report");
                    render(&pages)?
                }
            }
        }
        None => render(&pages)?,
    };

    info!(cards = cards.len(), bytes = pdf.len(), "Exported PDF report");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"report.pdf\""),
        ],
        pdf,
    )
        .into_response())
}

async fn read_template(path: &Path) -> Option<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot read report template");
            None
        }
    }
}

// ── Call simulation ─────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CallRequest {
    #[serde(default)]
    number: String,
}

/// Accepts a JSON body whatever the declared content type.
async fn simulate_call(body: Bytes) -> Result<Json<Value>, ApiError> {
    let req: CallRequest = serde_json::from_slice(&body).map_err(|e| {
        debug!(error = %e, "Call request is not valid JSON");
        ApiError::Validation("Invalid JSON body")
    })?;

    info!(number = %req.number, "Simulating call");
    Ok(Json(json!({
        "status": "success",
        "message": format!("Simulated call to {}", req.number),
    })))
}

// ── Voice ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct VoiceRequest {
    #[serde(default)]
    input: String,
}

async fn voice_reply(
    State(state): State<AppState>,
    body: Result<Json<VoiceRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let input = body.map(|Json(req)| req.input).unwrap_or_default();
    if input.trim().is_empty() {
        return Err(ApiError::Validation("No input provided"));
    }

    let context = state.latest_run().await;
    let messages = vec![
        ChatMessage::system(with_site_context(VOICE_SYSTEM_PROMPT, &context)),
        ChatMessage::user(input),
    ];

    let reply = state
        .chat
        .respond(messages)
        .await
        .map_err(|e| ApiError::upstream("AI completion failed", e))?;
    Ok(Json(json!({ "reply": reply })))
}

// ── Realtime session ────────────────────────────────────────────────────

async fn create_session(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let target = state
        .config
        .realtime
        .require(state.config.openai.api_key.is_some())?;

    let context = state.latest_run().await;
    let request = SessionRequest {
        model: target.model,
        voice: target.voice,
        instructions: with_site_context(REALTIME_INSTRUCTIONS, &context),
    };

    let session = state
        .sessions
        .create_session(request)
        .await
        .map_err(|e| ApiError::upstream("Failed to create realtime session", e))?;
    Ok(Json(session))
}

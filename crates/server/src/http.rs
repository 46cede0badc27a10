//! HTTP Endpoints
//!
//! Chat routes for audio and text, audio delivery, and service status.

use std::time::Duration;

use axum::{
    extract::{
        multipart::MultipartRejection, DefaultBodyLimit, Form, FromRequest, Multipart, Path,
        Request, State,
    },
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use voice_relay_core::{ChatReply, IncomingMessage};

use crate::metrics::{metrics_handler, track_requests};
use crate::state::AppState;
use crate::ServerError;

const AUDIO_MPEG: &str = "audio/mpeg";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.settings.server;
    let cors_layer = build_cors_layer(&server.cors_origins);
    let timeout = Duration::from_secs(server.timeout_seconds);
    let body_limit = server.max_upload_bytes;

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/intro", get(intro))
        // Chat
        .route("/chat/audio", post(chat_audio))
        .route("/chat/text", post(chat_text))
        // Synthesized replies
        .route("/audio/:filename", get(fetch_audio))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        .route_layer(middleware::from_fn(track_requests))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Any origin unless an explicit list is configured
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::error!("All configured CORS origins are invalid, allowing any origin");
        return CorsLayer::permissive();
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

async fn root() -> &'static str {
    "AI Therapist is running!"
}

async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let audio_dir = state.pipeline.store().dir().to_path_buf();
    let audio_dir_ok = tokio::fs::metadata(&audio_dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);

    let intro = state.intro_clip();
    let intro_ok = tokio::fs::metadata(&intro)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);

    let (status, status_code) = if audio_dir_ok {
        ("healthy", StatusCode::OK)
    } else {
        ("degraded", StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        status_code,
        Json(serde_json::json!({
            "status": status,
            "version": env!("CARGO_PKG_VERSION"),
            "stt_model": state.pipeline.stt_model(),
            "llm_model": state.pipeline.llm_model(),
            "tts_strategy": state.pipeline.tts_strategy(),
            "datastore_configured": state.settings.datastore.is_configured(),
            "checks": {
                "audio_dir": {
                    "status": if audio_dir_ok { "ok" } else { "missing" },
                    "path": audio_dir.display().to_string()
                },
                "intro_clip": {
                    "status": if intro_ok { "ok" } else { "missing" },
                    "path": intro.display().to_string()
                }
            }
        })),
    )
}

async fn intro(State(state): State<AppState>) -> Result<Response, ServerError> {
    let bytes = tokio::fs::read(state.intro_clip())
        .await
        .map_err(|_| ServerError::NotFound("File not found".to_string()))?;
    Ok(audio_response(bytes))
}

async fn chat_audio(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ChatReply>, ServerError> {
    let mut multipart = multipart.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Failed to read upload: {}", e)))?;
            upload = Some(bytes.to_vec());
            break;
        }
    }

    let bytes = upload.ok_or_else(|| ServerError::BadRequest("No file uploaded".to_string()))?;
    tracing::debug!(bytes = bytes.len(), "Audio message received");

    let reply = state.pipeline.submit(IncomingMessage::Audio(bytes)).await?;
    Ok(Json(reply))
}

#[derive(Debug, Deserialize)]
struct TextMessage {
    /// A missing field is handled like a blank one
    #[serde(default)]
    input_text: String,
}

/// Accepts `input_text` as a urlencoded or a multipart form
async fn chat_text(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<ChatReply>, ServerError> {
    let input_text = if is_multipart(&request) {
        read_multipart_text(&state, request).await?
    } else {
        let Form(form) = Form::<TextMessage>::from_request(request, &state)
            .await
            .map_err(|e| ServerError::BadRequest(e.body_text()))?;
        form.input_text
    };

    let reply = state
        .pipeline
        .submit(IncomingMessage::Text(input_text))
        .await?;
    Ok(Json(reply))
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

async fn read_multipart_text(state: &AppState, request: Request) -> Result<String, ServerError> {
    let mut multipart = Multipart::from_request(request, state)
        .await
        .map_err(|e| ServerError::BadRequest(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("input_text") {
            return field
                .text()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Failed to read input_text: {}", e)));
        }
    }

    // Missing field, same as blank
    Ok(String::new())
}

async fn fetch_audio(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ServerError> {
    let path = state.pipeline.store().resolve(&filename).await?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| ServerError::NotFound("File not found".to_string()))?;
    Ok(audio_response(bytes))
}

fn audio_response(bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, AUDIO_MPEG)], bytes).into_response()
}

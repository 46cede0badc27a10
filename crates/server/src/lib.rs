//! Voice Relay Server
//!
//! HTTP surface for the relay: chat routes, audio delivery, health, and
//! Prometheus metrics.

pub mod http;
pub mod metrics;
pub mod state;

pub use http::create_router;
pub use metrics::{init_metrics, record_request};
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Server errors
///
/// Rendered as `{"error": message}` with the matching status code.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),

    #[error("Startup error: {0}")]
    Startup(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Internal(_) | ServerError::Startup(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "Request rejected");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<voice_relay_core::Error> for ServerError {
    fn from(err: voice_relay_core::Error) -> Self {
        use voice_relay_core::Error as CoreError;

        match err {
            CoreError::EmptyInput(msg) => ServerError::BadRequest(msg),
            CoreError::NotFound(msg) => ServerError::NotFound(msg),
            CoreError::Generation(msg) => ServerError::Internal(msg),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<voice_relay_pipeline::PipelineError> for ServerError {
    fn from(err: voice_relay_pipeline::PipelineError) -> Self {
        ServerError::Startup(err.to_string())
    }
}

impl From<voice_relay_llm::LlmError> for ServerError {
    fn from(err: voice_relay_llm::LlmError) -> Self {
        ServerError::Startup(err.to_string())
    }
}

//! Response generation for the voice relay
//!
//! Features:
//! - Google Gemini `generateContent` backend behind a fixed persona
//! - Failures degrade to spoken sentinels instead of errors

pub mod gemini;

pub use gemini::{GeminiBackend, GeminiConfig};

use thiserror::Error;
use voice_relay_core::SoftFailure;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Response has no candidate text")]
    MissingContent,

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LlmError {
    /// Classify a failed generation for the caller
    pub fn into_soft_failure(self) -> SoftFailure {
        match self {
            LlmError::Api { status, .. } => SoftFailure::Unavailable { status },
            LlmError::MissingContent => SoftFailure::MissingContent,
            other => SoftFailure::Transport(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_failure_classification() {
        let api = LlmError::Api {
            status: 503,
            body: "overloaded".into(),
        };
        assert_eq!(api.into_soft_failure(), SoftFailure::Unavailable { status: 503 });
        assert_eq!(
            LlmError::MissingContent.into_soft_failure(),
            SoftFailure::MissingContent
        );
        assert!(matches!(
            LlmError::Timeout.into_soft_failure(),
            SoftFailure::Transport(_)
        ));
        assert!(matches!(
            LlmError::InvalidResponse("eof".into()).into_soft_failure(),
            SoftFailure::Transport(msg) if msg.contains("eof")
        ));
    }
}

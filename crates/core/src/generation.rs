//! Outcome of the response generation stage
//!
//! Generation never fails towards its caller. Instead of encoding failures as
//! magic strings deep in the backend, the backend returns a tagged outcome and
//! the sentinel text is only produced at the edge via [`GenerationOutcome::text`].

use serde::Serialize;

/// Spoken when the remote model answers with a non-success status
pub const UNAVAILABLE_SENTINEL: &str = "Error: Gemini API is not responding.";
/// Spoken when the payload lacks `candidates[0].content.parts[0].text`
pub const MISSING_CONTENT_SENTINEL: &str = "No response.";
/// Spoken on transport or decoding failures
pub const TRANSPORT_SENTINEL: &str = "Oops, something went wrong.";

/// Why generation degraded to a sentinel reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SoftFailure {
    /// Remote endpoint returned a non-success HTTP status
    Unavailable { status: u16 },
    /// Response decoded but the expected nested keys were absent
    MissingContent,
    /// Network error, timeout, malformed JSON, ...
    Transport(String),
}

impl SoftFailure {
    /// Sentinel text the user hears for this failure
    pub fn sentinel(&self) -> &'static str {
        match self {
            SoftFailure::Unavailable { .. } => UNAVAILABLE_SENTINEL,
            SoftFailure::MissingContent => MISSING_CONTENT_SENTINEL,
            SoftFailure::Transport(_) => TRANSPORT_SENTINEL,
        }
    }

    /// Short label for metrics and logs
    pub fn reason(&self) -> &'static str {
        match self {
            SoftFailure::Unavailable { .. } => "unavailable",
            SoftFailure::MissingContent => "missing_content",
            SoftFailure::Transport(_) => "transport",
        }
    }
}

/// Tagged result of a generation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Reply(String),
    SoftFailure(SoftFailure),
}

impl GenerationOutcome {
    /// Text forwarded to synthesis: the real reply or the sentinel
    pub fn text(&self) -> &str {
        match self {
            GenerationOutcome::Reply(text) => text,
            GenerationOutcome::SoftFailure(failure) => failure.sentinel(),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            GenerationOutcome::Reply(text) => text,
            GenerationOutcome::SoftFailure(failure) => failure.sentinel().to_string(),
        }
    }

    pub fn is_soft_failure(&self) -> bool {
        matches!(self, GenerationOutcome::SoftFailure(_))
    }
}

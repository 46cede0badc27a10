//! Request-scoped message types

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Persona instruction used when none is configured
pub const DEFAULT_PERSONA_INSTRUCTION: &str =
    "Hey, be a chill Gen Z therapist and keep it short and your name is Suhana";

/// What the client sent: an audio recording or a text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingMessage {
    /// Raw bytes of a single-channel speech recording
    Audio(Vec<u8>),
    Text(String),
}

/// Trimmed, non-empty user text (transcribed or typed)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript(String);

impl Transcript {
    /// Trim `raw`; blank input is rejected with `empty`
    pub fn parse(raw: &str, empty: impl FnOnce() -> Error) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for Transcript {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Fixed role instruction combined with the user's text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaPrompt {
    instruction: String,
}

impl Default for PersonaPrompt {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA_INSTRUCTION)
    }
}

impl PersonaPrompt {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
        }
    }

    /// Prompt text sent to the model for `user_text`
    pub fn render(&self, user_text: &str) -> String {
        format!("{} : {}", self.instruction, user_text)
    }
}

/// Egress payload for both chat routes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Trimmed input text (typed or transcribed)
    pub message: String,
    /// Generated reply or sentinel
    pub response: String,
    /// Where the client fetches the synthesized audio
    pub audio_url: String,
}

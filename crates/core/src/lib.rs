//! Core traits and types for the voice relay
//!
//! This crate provides foundational types used across all other crates:
//! - Stage traits for pluggable backends (STT, response generation, TTS)
//! - Request-scoped message types
//! - Per-request audio artifact naming and storage
//! - Error types

pub mod artifact;
pub mod error;
pub mod generation;
pub mod message;
pub mod traits;
pub mod voice_config;

pub use artifact::{ArtifactId, ArtifactKind, ArtifactStore, SynthesizedAudio};
pub use error::{Error, Result};
pub use generation::{GenerationOutcome, SoftFailure};
pub use message::{ChatReply, IncomingMessage, PersonaPrompt, Transcript};
pub use voice_config::{VoiceConfig, VoiceGender};

// Trait re-exports
pub use traits::{ResponseGenerator, SpeechToText, TextToSpeech};

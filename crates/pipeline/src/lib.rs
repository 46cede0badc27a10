//! Transcription, synthesis, and stage orchestration
//!
//! This crate provides the request pipeline of the relay:
//! - Speech-to-Text against an OpenAI-compatible Whisper service
//! - Text-to-Speech strategies (Google Translate voice + speed-up, Google Cloud voice)
//! - `ChatPipeline`, which runs transcribe → generate → synthesize per request

pub mod mock;
pub mod orchestrator;
pub mod stt;
pub mod tts;

pub use orchestrator::ChatPipeline;
pub use stt::{create_stt_backend, WhisperHttpConfig, WhisperHttpStt};
pub use tts::{
    create_tts_backend, CloudTtsConfig, GoogleCloudTts, GoogleTranslateTts, SpeedAdjuster,
    TranslateTtsConfig,
};

use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    #[error("STT error: {0}")]
    Stt(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err.to_string())
    }
}

impl From<PipelineError> for voice_relay_core::Error {
    fn from(err: PipelineError) -> Self {
        use voice_relay_core::Error as CoreError;

        match err {
            PipelineError::Stt(msg) => CoreError::Stt(msg),
            PipelineError::Tts(msg) => CoreError::Tts(msg),
            PipelineError::Io(msg) => CoreError::Io(msg),
            PipelineError::Configuration(msg) => CoreError::Configuration(msg),
        }
    }
}

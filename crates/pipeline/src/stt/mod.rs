//! Speech-to-Text backends

mod whisper_http;

pub use whisper_http::{WhisperHttpConfig, WhisperHttpStt};

use std::sync::Arc;

use voice_relay_config::SttConfig;
use voice_relay_core::SpeechToText;

use crate::PipelineError;

/// Build the shared STT backend and probe it once
///
/// An unreachable service is logged, not fatal: the first request will
/// surface the failure.
pub async fn create_stt_backend(config: &SttConfig) -> Result<Arc<dyn SpeechToText>, PipelineError> {
    let backend = WhisperHttpStt::new(WhisperHttpConfig::from(config))?;
    backend.probe().await;
    Ok(Arc::new(backend))
}

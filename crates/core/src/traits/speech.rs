//! Speech processing traits

use std::path::Path;

use async_trait::async_trait;

use crate::{ArtifactId, Result, SynthesizedAudio};

/// Speech-to-Text interface
///
/// Implementations:
/// - `WhisperHttpStt` - OpenAI-compatible Whisper transcription service
///
/// # Example
///
/// ```ignore
/// let stt: Arc<dyn SpeechToText> = Arc::new(WhisperHttpStt::new(config)?);
/// let text = stt.transcribe(&input_path).await?;
/// ```
#[async_trait]
pub trait SpeechToText: Send + Sync + 'static {
    /// Transcribe the recording at `audio_path`
    ///
    /// Returns the engine's best transcript. Callers trim and validate it;
    /// engine failures are returned as errors, never retried.
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}

/// Text-to-Speech interface
///
/// Implementations:
/// - `GoogleTranslateTts` - default voice, sped up after synthesis
/// - `GoogleCloudTts` - fixed Wavenet voice, returned unmodified
#[async_trait]
pub trait TextToSpeech: Send + Sync + 'static {
    /// Synthesize `text` into the request's artifact files
    ///
    /// # Returns
    /// The final audio file the client should fetch
    async fn synthesize(&self, text: &str, id: &ArtifactId) -> Result<SynthesizedAudio>;

    /// Get strategy name for logging
    fn model_name(&self) -> &str;
}

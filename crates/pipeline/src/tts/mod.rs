//! Text-to-Speech strategies
//!
//! The strategy is chosen once from configuration:
//! - `google_translate` (default): Google Translate voice, sped up with ffmpeg
//! - `google_cloud`: Google Cloud Wavenet voice, unmodified

mod google_cloud;
mod google_translate;
mod speed;

pub use google_cloud::{CloudTtsConfig, GoogleCloudTts};
pub use google_translate::{split_chunks, GoogleTranslateTts, TranslateTtsConfig, MAX_CHUNK_CHARS};
pub use speed::SpeedAdjuster;

use std::sync::Arc;

use voice_relay_config::{TtsConfig, TtsStrategy};
use voice_relay_core::{ArtifactStore, TextToSpeech};

use crate::PipelineError;

/// Build the configured synthesis strategy
pub fn create_tts_backend(
    config: &TtsConfig,
    store: ArtifactStore,
) -> Result<Arc<dyn TextToSpeech>, PipelineError> {
    let backend: Arc<dyn TextToSpeech> = match config.strategy {
        TtsStrategy::GoogleTranslate => Arc::new(GoogleTranslateTts::new(
            TranslateTtsConfig::from(config),
            store,
        )?),
        TtsStrategy::GoogleCloud => Arc::new(GoogleCloudTts::new(
            CloudTtsConfig::from_settings(config)?,
            store,
        )?),
    };

    tracing::info!(strategy = config.strategy.as_str(), "TTS strategy selected");
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_selection() {
        let store = ArtifactStore::new("audio", "http://127.0.0.1:8000");

        let tts = create_tts_backend(&TtsConfig::default(), store.clone()).unwrap();
        assert_eq!(tts.model_name(), "google_translate");

        let mut cloud = TtsConfig::default();
        cloud.strategy = TtsStrategy::GoogleCloud;
        assert!(create_tts_backend(&cloud, store.clone()).is_err());

        cloud.cloud.api_key = Some("k".into());
        let tts = create_tts_backend(&cloud, store).unwrap();
        assert_eq!(tts.model_name(), "google_cloud");
    }
}

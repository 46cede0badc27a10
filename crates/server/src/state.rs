//! Application State
//!
//! Shared, read-only state across all handlers.

use std::path::PathBuf;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use voice_relay_config::Settings;
use voice_relay_core::{ArtifactStore, ResponseGenerator};
use voice_relay_llm::{GeminiBackend, GeminiConfig};
use voice_relay_pipeline::{create_stt_backend, create_tts_backend, ChatPipeline};

use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub pipeline: ChatPipeline,
    /// Present when metrics are enabled and the recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(settings: Settings, pipeline: ChatPipeline) -> Self {
        Self {
            settings: Arc::new(settings),
            pipeline,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Build every stage backend from settings
    ///
    /// Backends are created once here and shared by all requests.
    pub async fn from_settings(settings: Settings) -> Result<Self, ServerError> {
        let store = ArtifactStore::new(
            settings.storage.audio_dir.clone(),
            settings.server.public_base_url.clone(),
        );
        store.ensure_dir().await?;

        let stt = create_stt_backend(&settings.stt).await?;
        let generator: Arc<dyn ResponseGenerator> =
            Arc::new(GeminiBackend::new(GeminiConfig::from(&settings.generation))?);
        let tts = create_tts_backend(&settings.tts, store.clone())?;

        tracing::info!(
            stt = stt.model_name(),
            llm = generator.model_name(),
            tts = tts.model_name(),
            audio_dir = %store.dir().display(),
            "Stage backends ready"
        );

        let pipeline = ChatPipeline::new(stt, generator, tts, store);
        Ok(Self::new(settings, pipeline))
    }

    pub fn intro_clip(&self) -> PathBuf {
        PathBuf::from(&self.settings.storage.intro_clip)
    }
}

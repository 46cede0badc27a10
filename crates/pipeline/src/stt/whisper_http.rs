//! HTTP STT Backend - OpenAI-compatible Whisper transcription service
//!
//! Uploads the request's recording as multipart to
//! `{endpoint}/v1/audio/transcriptions` and reads back `{"text": ...}`.
//! The client is built once and shared by every request.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use voice_relay_config::constants::{endpoints, speech};
use voice_relay_config::SttConfig;
use voice_relay_core::{Result as CoreResult, SpeechToText};

use crate::PipelineError;

/// Whisper HTTP backend configuration
#[derive(Debug, Clone)]
pub struct WhisperHttpConfig {
    /// Base URL of the transcription service
    pub endpoint: String,
    /// Model requested from the service (e.g. "tiny")
    pub model: String,
    /// Language hint; `None` lets the engine detect it
    pub language: Option<String>,
    pub timeout: Duration,
}

impl Default for WhisperHttpConfig {
    fn default() -> Self {
        Self {
            endpoint: endpoints::WHISPER_DEFAULT.to_string(),
            model: speech::STT_MODEL.to_string(),
            language: None,
            timeout: Duration::from_secs(speech::STT_TIMEOUT_SECS),
        }
    }
}

impl From<&SttConfig> for WhisperHttpConfig {
    fn from(cfg: &SttConfig) -> Self {
        Self {
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            language: cfg.language.clone(),
            timeout: Duration::from_secs(cfg.timeout_secs),
        }
    }
}

/// Response from the transcription service
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Whisper transcription client
pub struct WhisperHttpStt {
    config: WhisperHttpConfig,
    client: Client,
}

impl WhisperHttpStt {
    /// Create a new Whisper HTTP backend
    pub fn new(config: WhisperHttpConfig) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PipelineError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create with custom URL
    pub fn new_with_url(url: impl Into<String>) -> Result<Self, PipelineError> {
        Self::new(WhisperHttpConfig {
            endpoint: url.into(),
            ..Default::default()
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    /// Check whether the service answers its health endpoint
    pub async fn probe(&self) -> bool {
        match self.client.get(self.url("/health")).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!(
                    endpoint = %self.config.endpoint,
                    model = %self.config.model,
                    "STT service connected"
                );
                true
            },
            Ok(resp) => {
                tracing::warn!(
                    status = %resp.status(),
                    "STT service health check failed - proceeding anyway"
                );
                false
            },
            Err(e) => {
                tracing::warn!(error = %e, "STT service not reachable - proceeding anyway");
                false
            },
        }
    }

    /// Upload the recording and return the raw transcript
    async fn transcribe_file(&self, audio_path: &Path) -> Result<String, PipelineError> {
        let bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input.wav".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| PipelineError::Stt(format!("Invalid upload part: {}", e)))?;

        let mut form = Form::new()
            .part("file", part)
            .text("model", self.config.model.clone())
            .text("response_format", "json");
        if let Some(language) = &self.config.language {
            form = form.text("language", language.clone());
        }

        let response = self
            .client
            .post(self.url("/v1/audio/transcriptions"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| PipelineError::Stt(format!("Transcription request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Stt(format!(
                "Transcription service returned {}: {}",
                status, body
            )));
        }

        let result: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Stt(format!("Failed to parse transcription: {}", e)))?;

        Ok(result.text)
    }
}

#[async_trait]
impl SpeechToText for WhisperHttpStt {
    async fn transcribe(&self, audio_path: &Path) -> CoreResult<String> {
        Ok(self.transcribe_file(audio_path).await?)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

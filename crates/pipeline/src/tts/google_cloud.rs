//! Google Cloud Text-to-Speech - alternate voice
//!
//! Fixed Wavenet voice; the returned MP3 is written as-is with no speed
//! transform.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use voice_relay_config::constants::{endpoints, speech};
use voice_relay_config::TtsConfig;
use voice_relay_core::{
    ArtifactId, ArtifactKind, ArtifactStore, Result as CoreResult, SynthesizedAudio, TextToSpeech,
    VoiceConfig,
};

use crate::PipelineError;

/// Google Cloud TTS configuration
#[derive(Clone)]
pub struct CloudTtsConfig {
    pub endpoint: String,
    pub api_key: String,
    pub voice: VoiceConfig,
    pub timeout: Duration,
}

impl CloudTtsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoints::GOOGLE_CLOUD_TTS_DEFAULT.to_string(),
            api_key: api_key.into(),
            voice: VoiceConfig::wavenet_female(),
            timeout: Duration::from_secs(speech::TTS_TIMEOUT_SECS),
        }
    }

    pub fn from_settings(cfg: &TtsConfig) -> Result<Self, PipelineError> {
        let api_key = cfg
            .cloud
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                PipelineError::Configuration("Google Cloud TTS requires an API key".to_string())
            })?;

        Ok(Self {
            endpoint: cfg.cloud.endpoint.clone(),
            api_key,
            voice: cfg.cloud_voice(),
            timeout: Duration::from_secs(cfg.timeout_secs),
        })
    }
}

impl std::fmt::Debug for CloudTtsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudTtsConfig")
            .field("endpoint", &self.endpoint)
            .field("voice", &self.voice)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Google Cloud Wavenet voice
pub struct GoogleCloudTts {
    client: Client,
    config: CloudTtsConfig,
    store: ArtifactStore,
}

impl GoogleCloudTts {
    pub fn new(config: CloudTtsConfig, store: ArtifactStore) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PipelineError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            store,
        })
    }

    fn request_body<'a>(&'a self, text: &'a str) -> SynthesizeRequest<'a> {
        let voice = &self.config.voice;
        SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: &voice.language_code,
                name: (!voice.name.is_empty()).then_some(voice.name.as_str()),
                ssml_gender: voice.gender.map(|g| g.ssml_name()),
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
            },
        }
    }

    async fn synthesize_to_store(
        &self,
        text: &str,
        id: &ArtifactId,
    ) -> Result<SynthesizedAudio, PipelineError> {
        let url = format!(
            "{}/v1/text:synthesize",
            self.config.endpoint.trim_end_matches('/')
        );
        let response = self
            .client
            .post(url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&self.request_body(text))
            .send()
            .await
            .map_err(|e| PipelineError::Tts(format!("Cloud TTS request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Tts(format!(
                "Cloud TTS returned {}: {}",
                status, body
            )));
        }

        let payload: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Tts(format!("Failed to parse Cloud TTS response: {}", e)))?;
        let audio = BASE64
            .decode(payload.audio_content.as_bytes())
            .map_err(|e| PipelineError::Tts(format!("Invalid audioContent: {}", e)))?;

        let path = self.store.path(id, ArtifactKind::CloudSpeech);
        tokio::fs::write(&path, &audio).await?;
        tracing::debug!(voice = %self.config.voice.name, bytes = audio.len(), "Synthesized cloud voice");

        Ok(SynthesizedAudio {
            file_name: self.store.file_name(id, ArtifactKind::CloudSpeech),
            path,
            bytes_written: audio.len() as u64,
        })
    }
}

#[async_trait]
impl TextToSpeech for GoogleCloudTts {
    async fn synthesize(&self, text: &str, id: &ArtifactId) -> CoreResult<SynthesizedAudio> {
        Ok(self.synthesize_to_store(text, id).await?)
    }

    fn model_name(&self) -> &str {
        "google_cloud"
    }
}

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    #[serde(rename = "audioConfig")]
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ssml_gender: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

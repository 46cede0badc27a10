//! Google Translate TTS - default voice
//!
//! The endpoint only accepts short inputs, so text is split into chunks of at
//! most [`MAX_CHUNK_CHARS`] characters on whitespace. Each chunk comes back as
//! an MP3 segment; the segments are concatenated and then sped up.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use voice_relay_config::constants::{endpoints, speech};
use voice_relay_config::TtsConfig;
use voice_relay_core::{
    ArtifactId, ArtifactKind, ArtifactStore, Result as CoreResult, SynthesizedAudio, TextToSpeech,
    VoiceConfig,
};

use super::SpeedAdjuster;
use crate::PipelineError;

/// Longest text the endpoint accepts per request
pub const MAX_CHUNK_CHARS: usize = 100;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

/// Google Translate TTS configuration
#[derive(Debug, Clone)]
pub struct TranslateTtsConfig {
    /// Host serving `/translate_tts`
    pub endpoint: String,
    pub voice: VoiceConfig,
    pub ffmpeg_path: String,
    pub timeout: Duration,
}

impl Default for TranslateTtsConfig {
    fn default() -> Self {
        Self {
            endpoint: endpoints::GOOGLE_TRANSLATE_TTS_DEFAULT.to_string(),
            voice: VoiceConfig::new(speech::TTS_LANGUAGE).with_speed(speech::PLAYBACK_SPEED),
            ffmpeg_path: "ffmpeg".to_string(),
            timeout: Duration::from_secs(speech::TTS_TIMEOUT_SECS),
        }
    }
}

impl From<&TtsConfig> for TranslateTtsConfig {
    fn from(cfg: &TtsConfig) -> Self {
        Self {
            endpoint: cfg.endpoint.clone(),
            voice: cfg.translate_voice(),
            ffmpeg_path: cfg.ffmpeg_path.clone(),
            timeout: Duration::from_secs(cfg.timeout_secs),
        }
    }
}

/// Google Translate voice, sped up after synthesis
pub struct GoogleTranslateTts {
    client: Client,
    config: TranslateTtsConfig,
    speed: SpeedAdjuster,
    store: ArtifactStore,
}

impl GoogleTranslateTts {
    pub fn new(config: TranslateTtsConfig, store: ArtifactStore) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| PipelineError::Configuration(format!("Failed to create HTTP client: {}", e)))?;
        let speed = SpeedAdjuster::new(&config.ffmpeg_path, config.voice.speed);

        Ok(Self {
            client,
            config,
            speed,
            store,
        })
    }

    async fn fetch_chunk(&self, chunk: &str) -> Result<Vec<u8>, PipelineError> {
        let url = format!(
            "{}/translate_tts",
            self.config.endpoint.trim_end_matches('/')
        );
        let response = self
            .client
            .get(url)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", self.config.voice.language_code.as_str()),
                ("q", chunk),
            ])
            .send()
            .await
            .map_err(|e| PipelineError::Tts(format!("Speech request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Tts(format!(
                "Speech service returned {}",
                status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PipelineError::Tts(format!("Failed to read speech audio: {}", e)))?;
        Ok(bytes.to_vec())
    }

    async fn synthesize_to_store(
        &self,
        text: &str,
        id: &ArtifactId,
    ) -> Result<SynthesizedAudio, PipelineError> {
        let chunks = split_chunks(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(PipelineError::Tts("Nothing to synthesize".to_string()));
        }

        let mut audio = Vec::new();
        for chunk in &chunks {
            audio.extend(self.fetch_chunk(chunk).await?);
        }

        let speech_path = self.store.path(id, ArtifactKind::Speech);
        let fast_path = self.store.path(id, ArtifactKind::FastSpeech);
        tokio::fs::write(&speech_path, &audio).await?;

        let adjusted = self.speed.apply(&speech_path, &fast_path).await;
        self.store.discard(&speech_path).await;
        if let Err(e) = adjusted {
            // ffmpeg may leave a partial output behind
            self.store.discard(&fast_path).await;
            return Err(e);
        }

        let bytes_written = tokio::fs::metadata(&fast_path).await?.len();
        tracing::debug!(
            chunks = chunks.len(),
            speed = self.speed.speed(),
            bytes_written,
            "Synthesized default voice"
        );

        Ok(SynthesizedAudio {
            file_name: self.store.file_name(id, ArtifactKind::FastSpeech),
            path: fast_path,
            bytes_written,
        })
    }
}

#[async_trait]
impl TextToSpeech for GoogleTranslateTts {
    async fn synthesize(&self, text: &str, id: &ArtifactId) -> CoreResult<SynthesizedAudio> {
        Ok(self.synthesize_to_store(text, id).await?)
    }

    fn model_name(&self) -> &str {
        "google_translate"
    }
}

/// Split on whitespace into chunks of at most `max` characters
///
/// Words longer than `max` are broken at character boundaries.
pub fn split_chunks(text: &str, max: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            chunks.extend(chars.chunks(max).map(|piece| piece.iter().collect::<String>()));
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max {
            chunks.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_len = needed;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

//! Chat pipeline orchestrator
//!
//! Runs one request through its stages:
//!
//! ```text
//! Audio ─► STT ─┐
//!               ├─► Transcript ─► ResponseGenerator ─► TTS ─► ChatReply
//! Text ─────────┘
//! ```
//!
//! Stages run sequentially per request. Nothing is shared between requests
//! except the read-only stage backends; every file a request touches is named
//! after its own [`ArtifactId`].

use std::sync::Arc;
use std::time::Instant;

use voice_relay_core::{
    ArtifactId, ArtifactStore, ChatReply, Error, IncomingMessage, ResponseGenerator, Result,
    SpeechToText, TextToSpeech, Transcript,
};

/// Raised when generation yields an empty reply
pub const EMPTY_REPLY_MESSAGE: &str = "Failed to get AI response";

/// Transcribe → generate → synthesize
#[derive(Clone)]
pub struct ChatPipeline {
    stt: Arc<dyn SpeechToText>,
    generator: Arc<dyn ResponseGenerator>,
    tts: Arc<dyn TextToSpeech>,
    store: ArtifactStore,
}

impl ChatPipeline {
    pub fn new(
        stt: Arc<dyn SpeechToText>,
        generator: Arc<dyn ResponseGenerator>,
        tts: Arc<dyn TextToSpeech>,
        store: ArtifactStore,
    ) -> Self {
        Self {
            stt,
            generator,
            tts,
            store,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn stt_model(&self) -> &str {
        self.stt.model_name()
    }

    pub fn llm_model(&self) -> &str {
        self.generator.model_name()
    }

    pub fn tts_strategy(&self) -> &str {
        self.tts.model_name()
    }

    /// Handle either kind of message
    pub async fn submit(&self, message: IncomingMessage) -> Result<ChatReply> {
        match message {
            IncomingMessage::Audio(bytes) => self.submit_audio(&bytes).await,
            IncomingMessage::Text(text) => self.submit_text(&text).await,
        }
    }

    /// Transcribe a recording, then answer it
    ///
    /// A blank transcript stops the request before generation.
    pub async fn submit_audio(&self, bytes: &[u8]) -> Result<ChatReply> {
        let id = ArtifactId::new();
        let input_path = self.store.write_input(&id, bytes).await?;

        let start = Instant::now();
        let transcribed = self.stt.transcribe(&input_path).await;
        record_latency("voice_relay_stt_latency_ms", start);
        self.store.discard(&input_path).await;

        let raw = transcribed.map_err(|e| {
            tracing::error!(request_id = %id, error = %e, "Transcription failed");
            e
        })?;
        let transcript = Transcript::parse(&raw, Error::no_speech)?;
        tracing::info!(
            request_id = %id,
            model = self.stt.model_name(),
            chars = transcript.as_str().chars().count(),
            "Transcribed audio"
        );

        self.respond(id, transcript).await
    }

    /// Answer a typed message
    pub async fn submit_text(&self, text: &str) -> Result<ChatReply> {
        let transcript = Transcript::parse(text, Error::empty_message)?;
        self.respond(ArtifactId::new(), transcript).await
    }

    async fn respond(&self, id: ArtifactId, transcript: Transcript) -> Result<ChatReply> {
        let start = Instant::now();
        let outcome = self.generator.generate(transcript.as_str()).await;
        record_latency("voice_relay_llm_latency_ms", start);

        if outcome.is_soft_failure() {
            tracing::warn!(request_id = %id, "Answering with generation sentinel");
        }

        let response = outcome.into_text();
        if response.is_empty() {
            return Err(Error::Generation(EMPTY_REPLY_MESSAGE.to_string()));
        }

        let start = Instant::now();
        let audio = self
            .tts
            .synthesize(&response, &id)
            .await
            .map_err(|e| {
                tracing::error!(request_id = %id, error = %e, "Synthesis failed");
                e
            })?;
        record_latency("voice_relay_tts_latency_ms", start);

        tracing::info!(
            request_id = %id,
            strategy = self.tts.model_name(),
            file = %audio.file_name,
            bytes = audio.bytes_written,
            "Reply synthesized"
        );

        Ok(ChatReply {
            message: transcript.into_inner(),
            response,
            audio_url: self.store.url_for(&audio.file_name),
        })
    }
}

fn record_latency(name: &'static str, start: Instant) {
    metrics::histogram!(name).record(start.elapsed().as_secs_f64() * 1000.0);
}

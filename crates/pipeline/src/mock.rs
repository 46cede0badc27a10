//! In-process stage implementations for tests and local development
//!
//! None of these touch the network. `MockTts` writes the reply text itself as
//! the "audio", which makes per-request artifacts easy to tell apart.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use voice_relay_core::{
    ArtifactId, ArtifactKind, ArtifactStore, Error, GenerationOutcome, ResponseGenerator, Result,
    SpeechToText, SynthesizedAudio, TextToSpeech,
};

/// Returns a fixed transcript, or a fixed error
pub struct MockStt {
    result: std::result::Result<String, String>,
    calls: AtomicUsize,
}

impl MockStt {
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            result: Ok(transcript.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            result: Err(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechToText for MockStt {
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !tokio::fs::try_exists(audio_path).await? {
            return Err(Error::Stt(format!("{} does not exist", audio_path.display())));
        }
        self.result.clone().map_err(Error::Stt)
    }

    fn model_name(&self) -> &str {
        "mock-stt"
    }
}

enum GeneratorMode {
    Fixed(GenerationOutcome),
    Echo,
}

/// Returns a fixed outcome, or echoes the user text back
pub struct MockGenerator {
    mode: GeneratorMode,
    calls: AtomicUsize,
}

impl MockGenerator {
    pub fn new(outcome: GenerationOutcome) -> Self {
        Self {
            mode: GeneratorMode::Fixed(outcome),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn reply(text: impl Into<String>) -> Self {
        Self::new(GenerationOutcome::Reply(text.into()))
    }

    /// Reply with `Echo: {user_text}`
    pub fn echo() -> Self {
        Self {
            mode: GeneratorMode::Echo,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResponseGenerator for MockGenerator {
    async fn generate(&self, user_text: &str) -> GenerationOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            GeneratorMode::Fixed(outcome) => outcome.clone(),
            GeneratorMode::Echo => GenerationOutcome::Reply(format!("Echo: {}", user_text)),
        }
    }

    fn model_name(&self) -> &str {
        "mock-generator"
    }
}

/// Writes the text as the request's final audio file
pub struct MockTts {
    store: ArtifactStore,
    fail: Option<String>,
    calls: AtomicUsize,
}

impl MockTts {
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            store,
            fail: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(store: ArtifactStore, message: impl Into<String>) -> Self {
        Self {
            store,
            fail: Some(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextToSpeech for MockTts {
    async fn synthesize(&self, text: &str, id: &ArtifactId) -> Result<SynthesizedAudio> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.fail {
            return Err(Error::Tts(message.clone()));
        }

        let path = self.store.path(id, ArtifactKind::FastSpeech);
        tokio::fs::write(&path, text.as_bytes()).await?;
        Ok(SynthesizedAudio {
            file_name: self.store.file_name(id, ArtifactKind::FastSpeech),
            path,
            bytes_written: text.len() as u64,
        })
    }

    fn model_name(&self) -> &str {
        "mock-tts"
    }
}

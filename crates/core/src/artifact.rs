//! Per-request audio artifacts
//!
//! Every request gets its own [`ArtifactId`]; input, intermediate and final
//! audio files are all named after it, so concurrent requests never overwrite
//! each other's files.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Request-scoped identifier threaded through every stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactId(Uuid);

impl ArtifactId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ArtifactId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_simple())
    }
}

/// Role of a file within one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Uploaded recording handed to STT
    Input,
    /// Raw TTS output before the speed transform
    Speech,
    /// Sped-up speech returned to the client
    FastSpeech,
    /// Cloud voice output (no speed transform)
    CloudSpeech,
}

impl ArtifactKind {
    fn suffix(&self) -> &'static str {
        match self {
            ArtifactKind::Input => "input.wav",
            ArtifactKind::Speech => "response.mp3",
            ArtifactKind::FastSpeech => "response_fast.mp3",
            ArtifactKind::CloudSpeech => "response_google.mp3",
        }
    }
}

/// Final synthesized file for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    /// Bare file name, used in the audio URL
    pub file_name: String,
    pub path: PathBuf,
    pub bytes_written: u64,
}

/// Directory holding request artifacts plus the public URL prefix for them
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    public_base_url: String,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the artifact directory if needed
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    pub fn file_name(&self, id: &ArtifactId, kind: ArtifactKind) -> String {
        format!("{}-{}", id, kind.suffix())
    }

    pub fn path(&self, id: &ArtifactId, kind: ArtifactKind) -> PathBuf {
        self.dir.join(self.file_name(id, kind))
    }

    /// Public URL under which `file_name` is served
    pub fn url_for(&self, file_name: &str) -> String {
        format!("{}/audio/{}", self.public_base_url, file_name)
    }

    /// Persist an uploaded recording, returning its path
    pub async fn write_input(&self, id: &ArtifactId, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path(id, ArtifactKind::Input);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Resolve a client-supplied name to an existing file in the store
    ///
    /// Only bare file names are accepted; anything that could escape the
    /// directory is reported as not found.
    pub async fn resolve(&self, name: &str) -> Result<PathBuf> {
        if !is_bare_file_name(name) {
            return Err(Error::file_not_found());
        }
        let path = self.dir.join(name);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            _ => Err(Error::file_not_found()),
        }
    }

    /// Best-effort removal of a scratch file
    pub async fn discard(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(path = %path.display(), error = %e, "Failed to remove artifact");
            }
        }
    }
}

fn is_bare_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
        && !name.contains("..")
}

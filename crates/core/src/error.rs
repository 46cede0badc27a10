//! Error types shared by every stage of the relay

use thiserror::Error;

/// Result alias used by the stage traits
pub type Result<T> = std::result::Result<T, Error>;

/// Relay errors
///
/// Transcription and synthesis failures surface as `Stt` / `Tts` and are
/// never recovered locally. Response generation does not produce this type at
/// all (see [`crate::GenerationOutcome`]) except through `Generation`, which is
/// raised when the stage yields an empty reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No speech detected or blank text submitted
    #[error("{0}")]
    EmptyInput(String),

    /// Generation stage could not produce a usable reply
    #[error("{0}")]
    Generation(String),

    #[error("STT error: {0}")]
    Stt(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("IO error: {0}")]
    Io(String),

    /// Requested artifact does not exist
    #[error("{0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Blank transcript from the audio path
    pub fn no_speech() -> Self {
        Error::EmptyInput("No speech detected".to_string())
    }

    /// Blank text from the text path
    pub fn empty_message() -> Self {
        Error::EmptyInput("Empty message".to_string())
    }

    pub fn file_not_found() -> Self {
        Error::NotFound("File not found".to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

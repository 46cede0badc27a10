//! Core traits for the relay stages
//!
//! Each stage is a trait so backends can be swapped from configuration and
//! replaced by mocks in tests.
//!
//! ```text
//! Speech Processing:
//!   - SpeechToText: recording on disk → text
//!   - TextToSpeech: text → audio file on disk
//!
//! Language Models:
//!   - ResponseGenerator: user text → reply (never fails)
//! ```

mod llm;
mod speech;

pub use llm::ResponseGenerator;
pub use speech::{SpeechToText, TextToSpeech};

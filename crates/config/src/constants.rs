//! Centralized constants for the voice relay
//!
//! Default endpoints and tunables live here so settings defaults and tests
//! agree on a single value.

/// Remote service endpoints
pub mod endpoints {
    /// Gemini REST API base
    pub const GEMINI_DEFAULT: &str = "https://generativelanguage.googleapis.com";

    /// Local OpenAI-compatible Whisper service
    pub const WHISPER_DEFAULT: &str = "http://127.0.0.1:8091";

    /// Google Translate TTS host (default voice)
    pub const GOOGLE_TRANSLATE_TTS_DEFAULT: &str = "https://translate.google.com";

    /// Google Cloud Text-to-Speech API base (alternate voice)
    pub const GOOGLE_CLOUD_TTS_DEFAULT: &str = "https://texttospeech.googleapis.com";

    /// Prefix for audio URLs handed to the client
    pub const PUBLIC_BASE_URL_DEFAULT: &str = "http://127.0.0.1:8000";
}

/// Response generation defaults
pub mod generation {
    pub const DEFAULT_MODEL: &str = "gemini-pro";

    /// Output token cap per reply
    pub const MAX_OUTPUT_TOKENS: u32 = 50;

    pub const TIMEOUT_SECS: u64 = 30;
}

/// Speech defaults
pub mod speech {
    /// Whisper model requested from the STT service
    pub const STT_MODEL: &str = "tiny";

    pub const STT_TIMEOUT_SECS: u64 = 60;

    /// Playback speed applied to the default voice
    pub const PLAYBACK_SPEED: f32 = 1.35;

    pub const MIN_PLAYBACK_SPEED: f32 = 0.5;
    pub const MAX_PLAYBACK_SPEED: f32 = 4.0;

    pub const TTS_TIMEOUT_SECS: u64 = 30;

    /// Default voice language
    pub const TTS_LANGUAGE: &str = "en";
}

/// Well-known environment variable names
pub mod env {
    pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
    pub const SUPABASE_URL: &str = "SUPABASE_URL";
    pub const SUPABASE_KEY: &str = "SUPABASE_KEY";
    pub const GOOGLE_TTS_API_KEY: &str = "GOOGLE_TTS_API_KEY";
    pub const PORT: &str = "PORT";
}

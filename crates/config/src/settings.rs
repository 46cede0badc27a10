//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use voice_relay_core::{VoiceConfig, VoiceGender};

use crate::constants::{endpoints, env, generation, speech};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Response generation (Gemini)
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Speech-to-text service
    #[serde(default)]
    pub stt: SttConfig,

    /// Speech synthesis strategy and voices
    #[serde(default)]
    pub tts: TtsConfig,

    /// Where request artifacts and the intro clip live
    #[serde(default)]
    pub storage: StorageConfig,

    /// Datastore credentials (provisioned, not used by any route)
    #[serde(default)]
    pub datastore: DatastoreConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Prefix of the `audio_url` returned to clients
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Whole-request timeout
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Upload limit for `/chat/audio`
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_public_base_url() -> String {
    endpoints::PUBLIC_BASE_URL_DEFAULT.to_string()
}
fn default_timeout() -> u64 {
    120
}
fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_base_url: default_public_base_url(),
            cors_origins: Vec::new(),
            timeout_seconds: default_timeout(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Gemini generation settings
#[derive(Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Required; usually supplied through `GEMINI_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// 0 disables the timeout
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,

    /// Persona instruction; `None` uses the built-in therapist persona
    #[serde(default)]
    pub persona_instruction: Option<String>,
}

fn default_gemini_endpoint() -> String {
    endpoints::GEMINI_DEFAULT.to_string()
}
fn default_gemini_model() -> String {
    generation::DEFAULT_MODEL.to_string()
}
fn default_max_output_tokens() -> u32 {
    generation::MAX_OUTPUT_TOKENS
}
fn default_generation_timeout() -> u64 {
    generation::TIMEOUT_SECS
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_gemini_endpoint(),
            model: default_gemini_model(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_generation_timeout(),
            persona_instruction: None,
        }
    }
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("persona_instruction", &self.persona_instruction)
            .finish()
    }
}

/// Speech-to-text service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttConfig {
    /// Base URL of the OpenAI-compatible transcription service
    #[serde(default = "default_whisper_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_stt_model")]
    pub model: String,

    /// Language hint; `None` lets the engine detect it
    #[serde(default)]
    pub language: Option<String>,

    #[serde(default = "default_stt_timeout")]
    pub timeout_secs: u64,
}

fn default_whisper_endpoint() -> String {
    endpoints::WHISPER_DEFAULT.to_string()
}
fn default_stt_model() -> String {
    speech::STT_MODEL.to_string()
}
fn default_stt_timeout() -> u64 {
    speech::STT_TIMEOUT_SECS
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            endpoint: default_whisper_endpoint(),
            model: default_stt_model(),
            language: None,
            timeout_secs: default_stt_timeout(),
        }
    }
}

/// Which synthesis strategy serves requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TtsStrategy {
    /// Google Translate voice, sped up with ffmpeg
    #[default]
    GoogleTranslate,
    /// Google Cloud Wavenet voice, unmodified
    GoogleCloud,
}

impl TtsStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TtsStrategy::GoogleTranslate => "google_translate",
            TtsStrategy::GoogleCloud => "google_cloud",
        }
    }
}

/// Speech synthesis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub strategy: TtsStrategy,

    /// Language of the default voice
    #[serde(default = "default_tts_language")]
    pub language: String,

    /// Playback speed applied to the default voice
    #[serde(default = "default_playback_speed")]
    pub speed: f32,

    /// Google Translate TTS host
    #[serde(default = "default_translate_endpoint")]
    pub endpoint: String,

    /// ffmpeg binary used for the speed transform
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub cloud: CloudVoiceConfig,
}

fn default_tts_language() -> String {
    speech::TTS_LANGUAGE.to_string()
}
fn default_playback_speed() -> f32 {
    speech::PLAYBACK_SPEED
}
fn default_translate_endpoint() -> String {
    endpoints::GOOGLE_TRANSLATE_TTS_DEFAULT.to_string()
}
fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}
fn default_tts_timeout() -> u64 {
    speech::TTS_TIMEOUT_SECS
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            strategy: TtsStrategy::default(),
            language: default_tts_language(),
            speed: default_playback_speed(),
            endpoint: default_translate_endpoint(),
            ffmpeg_path: default_ffmpeg_path(),
            timeout_secs: default_tts_timeout(),
            cloud: CloudVoiceConfig::default(),
        }
    }
}

impl TtsConfig {
    /// Voice for the Google Translate strategy
    pub fn translate_voice(&self) -> VoiceConfig {
        VoiceConfig::new(self.language.clone()).with_speed(self.speed)
    }

    /// Voice for the Google Cloud strategy (no speed transform)
    pub fn cloud_voice(&self) -> VoiceConfig {
        let voice = VoiceConfig::new(self.cloud.language_code.clone())
            .with_name(self.cloud.voice_name.clone());
        match parse_gender(&self.cloud.gender) {
            Some(gender) => voice.with_gender(gender),
            None => voice,
        }
    }
}

fn parse_gender(raw: &str) -> Option<VoiceGender> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "MALE" => Some(VoiceGender::Male),
        "FEMALE" => Some(VoiceGender::Female),
        "NEUTRAL" => Some(VoiceGender::Neutral),
        _ => None,
    }
}

/// Google Cloud TTS voice settings
#[derive(Clone, Serialize, Deserialize)]
pub struct CloudVoiceConfig {
    #[serde(default = "default_cloud_endpoint")]
    pub endpoint: String,

    /// Required when `tts.strategy = google_cloud`
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_cloud_language")]
    pub language_code: String,

    #[serde(default = "default_cloud_voice")]
    pub voice_name: String,

    #[serde(default = "default_cloud_gender")]
    pub gender: String,
}

fn default_cloud_endpoint() -> String {
    endpoints::GOOGLE_CLOUD_TTS_DEFAULT.to_string()
}
fn default_cloud_language() -> String {
    "en-US".to_string()
}
fn default_cloud_voice() -> String {
    "en-US-Wavenet-F".to_string()
}
fn default_cloud_gender() -> String {
    "FEMALE".to_string()
}

impl Default for CloudVoiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_cloud_endpoint(),
            api_key: None,
            language_code: default_cloud_language(),
            voice_name: default_cloud_voice(),
            gender: default_cloud_gender(),
        }
    }
}

impl std::fmt::Debug for CloudVoiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudVoiceConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("language_code", &self.language_code)
            .field("voice_name", &self.voice_name)
            .field("gender", &self.gender)
            .finish()
    }
}

/// Artifact storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for per-request input and synthesized audio
    #[serde(default = "default_audio_dir")]
    pub audio_dir: String,

    /// Greeting clip served at `/intro`
    #[serde(default = "default_intro_clip")]
    pub intro_clip: String,
}

fn default_audio_dir() -> String {
    "audio".to_string()
}
fn default_intro_clip() -> String {
    "intro.mp3".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            audio_dir: default_audio_dir(),
            intro_clip: default_intro_clip(),
        }
    }
}

/// Datastore credentials
///
/// Nothing in the request flow consumes these; they are optional and only
/// checked for consistency.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct DatastoreConfig {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub key: Option<String>,
}

impl DatastoreConfig {
    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.key.is_some()
    }
}

impl std::fmt::Debug for DatastoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatastoreConfig")
            .field("url", &self.url)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Expose Prometheus metrics at `/metrics`
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_generation()?;
        self.validate_tts()?;
        self.validate_server()?;
        self.validate_datastore();
        Ok(())
    }

    fn validate_generation(&self) -> Result<(), ConfigError> {
        match self.generation.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => {},
            _ => return Err(ConfigError::MissingField(env::GEMINI_API_KEY.to_string())),
        }

        if self.generation.max_output_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "generation.max_output_tokens".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    fn validate_tts(&self) -> Result<(), ConfigError> {
        let speed = self.tts.speed;
        if !(speech::MIN_PLAYBACK_SPEED..=speech::MAX_PLAYBACK_SPEED).contains(&speed) {
            return Err(ConfigError::InvalidValue {
                field: "tts.speed".to_string(),
                message: format!(
                    "Must be between {} and {}, got {}",
                    speech::MIN_PLAYBACK_SPEED,
                    speech::MAX_PLAYBACK_SPEED,
                    speed
                ),
            });
        }

        if self.tts.strategy == TtsStrategy::GoogleCloud {
            let has_key = self
                .tts
                .cloud
                .api_key
                .as_deref()
                .is_some_and(|k| !k.trim().is_empty());
            if !has_key {
                return Err(ConfigError::MissingField(env::GOOGLE_TTS_API_KEY.to_string()));
            }
        }

        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if !(server.public_base_url.starts_with("http://")
            || server.public_base_url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidValue {
                field: "server.public_base_url".to_string(),
                message: format!("Must be an http(s) URL, got {}", server.public_base_url),
            });
        }

        if self.environment.is_production() && server.cors_origins.is_empty() {
            tracing::warn!("No CORS origins configured in production; any origin is allowed");
        }

        Ok(())
    }

    fn validate_datastore(&self) {
        let ds = &self.datastore;
        if ds.url.is_some() != ds.key.is_some() {
            tracing::warn!(
                "Only one of {} / {} is set; datastore stays unconfigured",
                env::SUPABASE_URL,
                env::SUPABASE_KEY
            );
        }
    }

    /// Apply the conventional, unprefixed environment variables
    ///
    /// These take precedence over file and `VOICE_RELAY__` sources.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(env::GEMINI_API_KEY) {
            self.generation.api_key = Some(key);
        }
        if let Some(url) = non_empty(env::SUPABASE_URL) {
            self.datastore.url = Some(url);
        }
        if let Some(key) = non_empty(env::SUPABASE_KEY) {
            self.datastore.key = Some(key);
        }
        if let Some(key) = non_empty(env::GOOGLE_TTS_API_KEY) {
            self.tts.cloud.api_key = Some(key);
        }
        if let Some(port) = non_empty(env::PORT) {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: env::PORT.to_string(),
                message: format!("Not a valid port: {}", port),
            })?;
        }

        Ok(())
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Conventional variables (`GEMINI_API_KEY`, `PORT`, ...)
/// 2. Environment variables (`VOICE_RELAY__` prefix)
/// 3. config/{env}.yaml (if env specified)
/// 4. config/default.yaml
///
/// A `.env` file in the working directory is loaded first when present.
pub fn load_settings(env_name: Option<&str>) -> Result<Settings, ConfigError> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(ConfigError::Environment(format!("Failed to read .env: {}", e)));
        }
    }

    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(name) = env_name {
        builder = builder.add_source(File::with_name(&format!("config/{}", name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("VOICE_RELAY")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let mut settings: Settings = config.try_deserialize()?;

    settings.apply_env_overrides(|name| std::env::var(name).ok())?;
    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.generation.api_key = Some("test-key".to_string());
        settings
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.server.public_base_url, "http://127.0.0.1:8000");
        assert_eq!(settings.generation.max_output_tokens, 50);
        assert_eq!(settings.generation.model, "gemini-pro");
        assert_eq!(settings.tts.strategy, TtsStrategy::GoogleTranslate);
        assert!((settings.tts.speed - 1.35).abs() < f32::EPSILON);
    }

    #[test]
    fn test_missing_gemini_key_fails_fast() {
        let settings = Settings::default();
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(f) if f == "GEMINI_API_KEY"));

        let mut blank = Settings::default();
        blank.generation.api_key = Some("   ".to_string());
        assert!(blank.validate().is_err());

        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn test_datastore_is_optional() {
        let mut settings = valid_settings();
        settings.datastore.url = Some("https://db.example".to_string());
        assert!(settings.validate().is_ok());
        assert!(!settings.datastore.is_configured());

        settings.datastore.key = Some("secret".to_string());
        assert!(settings.datastore.is_configured());
    }

    #[test]
    fn test_tts_validation() {
        let mut settings = valid_settings();
        settings.tts.speed = 0.2;
        assert!(settings.validate_tts().is_err());
        settings.tts.speed = 5.0;
        assert!(settings.validate_tts().is_err());
        settings.tts.speed = 1.35;
        assert!(settings.validate_tts().is_ok());

        settings.tts.strategy = TtsStrategy::GoogleCloud;
        assert!(matches!(
            settings.validate_tts(),
            Err(ConfigError::MissingField(f)) if f == "GOOGLE_TTS_API_KEY"
        ));
        settings.tts.cloud.api_key = Some("cloud-key".to_string());
        assert!(settings.validate_tts().is_ok());
    }

    #[test]
    fn test_voice_helpers() {
        let tts = TtsConfig::default();
        let voice = tts.translate_voice();
        assert_eq!(voice.language_code, "en");
        assert!((voice.speed - 1.35).abs() < f32::EPSILON);

        let cloud = tts.cloud_voice();
        assert_eq!(cloud, VoiceConfig::wavenet_female());

        let mut odd = TtsConfig::default();
        odd.cloud.gender = "robot".to_string();
        assert_eq!(odd.cloud_voice().gender, None);
    }

    #[test]
    fn test_server_validation() {
        let mut settings = valid_settings();

        settings.server.port = 0;
        assert!(settings.validate_server().is_err());
        settings.server.port = 8000;

        settings.server.timeout_seconds = 0;
        assert!(settings.validate_server().is_err());
        settings.server.timeout_seconds = 30;

        settings.server.public_base_url = "127.0.0.1:8000".to_string();
        assert!(settings.validate_server().is_err());
        settings.server.public_base_url = "https://relay.example.com".to_string();

        assert!(settings.validate_server().is_ok());
    }

    #[test]
    fn test_generation_token_cap() {
        let mut settings = valid_settings();
        settings.generation.max_output_tokens = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings
            .apply_env_overrides(lookup(&[
                ("GEMINI_API_KEY", "g-key"),
                ("SUPABASE_URL", "https://db.example"),
                ("SUPABASE_KEY", "db-key"),
                ("GOOGLE_TTS_API_KEY", "tts-key"),
                ("PORT", "5000"),
            ]))
            .unwrap();

        assert_eq!(settings.generation.api_key.as_deref(), Some("g-key"));
        assert!(settings.datastore.is_configured());
        assert_eq!(settings.tts.cloud.api_key.as_deref(), Some("tts-key"));
        assert_eq!(settings.server.port, 5000);
    }

    #[test]
    fn test_env_overrides_ignore_blank_and_reject_bad_port() {
        let mut settings = valid_settings();
        settings
            .apply_env_overrides(lookup(&[("GEMINI_API_KEY", "  ")]))
            .unwrap();
        assert_eq!(settings.generation.api_key.as_deref(), Some("test-key"));

        let err = settings
            .apply_env_overrides(lookup(&[("PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_secrets_redacted_in_debug() {
        let mut settings = valid_settings();
        settings.datastore.key = Some("db-secret".to_string());
        settings.tts.cloud.api_key = Some("tts-secret".to_string());

        let debug = format!("{:?}", settings);
        assert!(!debug.contains("test-key"));
        assert!(!debug.contains("db-secret"));
        assert!(!debug.contains("tts-secret"));
        assert!(debug.contains("<redacted>"));
    }
}

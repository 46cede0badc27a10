//! Voice configuration types for TTS

use serde::{Deserialize, Serialize};

/// Voice selection for synthesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// BCP-47 language code (e.g. "en", "en-US")
    pub language_code: String,
    /// Provider voice name; empty means provider default
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gender: Option<VoiceGender>,
    /// Playback speed applied after synthesis (1.0 = unchanged)
    #[serde(default = "default_speed")]
    pub speed: f32,
}

fn default_speed() -> f32 {
    1.0
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            language_code: "en".to_string(),
            name: String::new(),
            gender: None,
            speed: 1.0,
        }
    }
}

impl VoiceConfig {
    pub fn new(language_code: impl Into<String>) -> Self {
        Self {
            language_code: language_code.into(),
            ..Default::default()
        }
    }

    /// Female US-English Wavenet voice used by the cloud strategy
    pub fn wavenet_female() -> Self {
        Self::new("en-US")
            .with_name("en-US-Wavenet-F")
            .with_gender(VoiceGender::Female)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_gender(mut self, gender: VoiceGender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed.clamp(0.5, 4.0);
        self
    }
}

/// Voice gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    Male,
    Female,
    Neutral,
}

impl VoiceGender {
    /// SSML gender name as expected by cloud TTS APIs
    pub fn ssml_name(&self) -> &'static str {
        match self {
            VoiceGender::Male => "MALE",
            VoiceGender::Female => "FEMALE",
            VoiceGender::Neutral => "NEUTRAL",
        }
    }
}

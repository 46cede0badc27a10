//! Google Gemini backend
//!
//! Single-shot `generateContent` call: the persona prompt and the user text go
//! out as one part, the first candidate's first part comes back. There is no
//! conversation memory and no retry.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use voice_relay_config::constants::{endpoints, generation};
use voice_relay_config::GenerationConfig;
use voice_relay_core::{GenerationOutcome, PersonaPrompt, ResponseGenerator};

use crate::LlmError;

/// Gemini configuration
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    /// API base, e.g. `https://generativelanguage.googleapis.com`
    pub endpoint: String,
    pub model: String,
    /// Output token cap
    pub max_output_tokens: u32,
    /// `None` waits indefinitely
    pub timeout: Option<Duration>,
    pub persona: PersonaPrompt,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: endpoints::GEMINI_DEFAULT.to_string(),
            model: generation::DEFAULT_MODEL.to_string(),
            max_output_tokens: generation::MAX_OUTPUT_TOKENS,
            timeout: Some(Duration::from_secs(generation::TIMEOUT_SECS)),
            persona: PersonaPrompt::default(),
        }
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl From<&GenerationConfig> for GeminiConfig {
    fn from(cfg: &GenerationConfig) -> Self {
        let persona = cfg
            .persona_instruction
            .as_deref()
            .map(PersonaPrompt::new)
            .unwrap_or_default();

        Self {
            api_key: cfg.api_key.clone().unwrap_or_default(),
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            max_output_tokens: cfg.max_output_tokens,
            timeout: (cfg.timeout_secs > 0).then(|| Duration::from_secs(cfg.timeout_secs)),
            persona,
        }
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Gemini `generateContent` client
#[derive(Clone)]
pub struct GeminiBackend {
    client: Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    /// Create a new Gemini backend
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::Configuration("Gemini API key is empty".to_string()));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Perform the remote call and extract the reply text
    async fn request(&self, user_text: &str) -> Result<String, LlmError> {
        let prompt = self.config.persona.render(user_text);
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
            generation_config: GenerationSettings {
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(self.generate_url())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        // Anything but 200 is an unavailable service, other 2xx included
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let raw = response.text().await?;
        let value: Value =
            serde_json::from_str(&raw).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        extract_reply(&value)
            .map(str::to_string)
            .ok_or(LlmError::MissingContent)
    }
}

/// `candidates[0].content.parts[0].text`
fn extract_reply(value: &Value) -> Option<&str> {
    value
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
}

#[async_trait]
impl ResponseGenerator for GeminiBackend {
    async fn generate(&self, user_text: &str) -> GenerationOutcome {
        let start = Instant::now();
        let result = self.request(user_text).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(text) => {
                tracing::debug!(
                    model = %self.config.model,
                    elapsed_ms,
                    reply_chars = text.chars().count(),
                    "Gemini reply received"
                );
                GenerationOutcome::Reply(text)
            },
            Err(e) => {
                let failure = e.into_soft_failure();
                tracing::warn!(
                    model = %self.config.model,
                    elapsed_ms,
                    reason = failure.reason(),
                    failure = ?failure,
                    "Gemini call failed, answering with sentinel"
                );
                metrics::counter!(
                    "voice_relay_llm_soft_failures_total",
                    "reason" => failure.reason()
                )
                .increment(1);
                GenerationOutcome::SoftFailure(failure)
            },
        }
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationSettings,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationSettings {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use voice_relay_core::SoftFailure;

    const PATH: &str = "/v1beta/models/gemini-pro:generateContent";

    fn backend_for(url: &str) -> GeminiBackend {
        let config = GeminiConfig::new("test-key")
            .with_endpoint(url)
            .with_timeout(Some(Duration::from_secs(5)));
        GeminiBackend::new(config).unwrap()
    }

    #[test]
    fn test_request_serialization() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: "persona : hi" }],
            }],
            generation_config: GenerationSettings {
                max_output_tokens: 50,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            json!({
                "contents": [{"parts": [{"text": "persona : hi"}]}],
                "generationConfig": {"maxOutputTokens": 50}
            })
        );
    }

    #[test]
    fn test_extract_reply() {
        let ok = json!({"candidates": [{"content": {"parts": [{"text": "hey"}]}}]});
        assert_eq!(extract_reply(&ok), Some("hey"));

        assert_eq!(extract_reply(&json!({})), None);
        assert_eq!(extract_reply(&json!({"candidates": []})), None);
        assert_eq!(
            extract_reply(&json!({"candidates": [{"content": {"parts": []}}]})),
            None
        );
        assert_eq!(
            extract_reply(&json!({"candidates": [{"content": {"parts": [{"text": 7}]}}]})),
            None
        );
    }

    #[test]
    fn test_rejects_empty_key() {
        assert!(matches!(
            GeminiBackend::new(GeminiConfig::new("  ")),
            Err(LlmError::Configuration(_))
        ));
    }

    #[test]
    fn test_from_settings() {
        let mut cfg = GenerationConfig::default();
        cfg.api_key = Some("k".into());
        cfg.timeout_secs = 0;
        cfg.persona_instruction = Some("Be calm".into());

        let gemini = GeminiConfig::from(&cfg);
        assert_eq!(gemini.api_key, "k");
        assert_eq!(gemini.timeout, None);
        assert_eq!(gemini.persona.render("x"), "Be calm : x");
        assert_eq!(gemini.max_output_tokens, 50);
    }

    #[tokio::test]
    async fn test_generate_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .match_body(Matcher::PartialJson(json!({
                "contents": [{"parts": [{"text": format!(
                    "{} : I feel anxious today",
                    voice_relay_core::message::DEFAULT_PERSONA_INSTRUCTION
                )}]}],
                "generationConfig": {"maxOutputTokens": 50}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"candidates": [{"content": {"parts": [{"text": "Deep breaths, you got this"}]}}]})
                    .to_string(),
            )
            .create_async()
            .await;

        let backend = backend_for(&server.url());
        let outcome = backend.generate("I feel anxious today").await;

        mock.assert_async().await;
        assert_eq!(
            outcome,
            GenerationOutcome::Reply("Deep breaths, you got this".into())
        );
    }

    #[tokio::test]
    async fn test_generate_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("internal")
            .create_async()
            .await;

        let outcome = backend_for(&server.url()).generate("hi").await;
        assert_eq!(
            outcome,
            GenerationOutcome::SoftFailure(SoftFailure::Unavailable { status: 500 })
        );
        assert_eq!(outcome.text(), "Error: Gemini API is not responding.");
    }

    #[tokio::test]
    async fn test_generate_no_content_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .match_query(Matcher::Any)
            .with_status(204)
            .create_async()
            .await;

        let outcome = backend_for(&server.url()).generate("hi").await;
        assert_eq!(
            outcome,
            GenerationOutcome::SoftFailure(SoftFailure::Unavailable { status: 204 })
        );
        assert_eq!(outcome.text(), "Error: Gemini API is not responding.");
    }

    #[tokio::test]
    async fn test_generate_missing_keys() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#)
            .create_async()
            .await;

        let outcome = backend_for(&server.url()).generate("hi").await;
        assert_eq!(outcome.text(), "No response.");
    }

    #[tokio::test]
    async fn test_generate_empty_candidates() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"candidates": []}"#)
            .create_async()
            .await;

        let outcome = backend_for(&server.url()).generate("hi").await;
        assert_eq!(
            outcome,
            GenerationOutcome::SoftFailure(SoftFailure::MissingContent)
        );
    }

    #[tokio::test]
    async fn test_generate_malformed_json() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("{not json")
            .create_async()
            .await;

        let outcome = backend_for(&server.url()).generate("hi").await;
        assert!(matches!(
            outcome,
            GenerationOutcome::SoftFailure(SoftFailure::Transport(_))
        ));
        assert_eq!(outcome.text(), "Oops, something went wrong.");
    }

    #[tokio::test]
    async fn test_generate_unreachable() {
        // Nothing listens on port 1
        let outcome = backend_for("http://127.0.0.1:1").generate("hi").await;
        assert_eq!(outcome.text(), "Oops, something went wrong.");
    }

    #[test]
    fn test_model_name_and_url() {
        let backend = backend_for("http://localhost:9999/");
        assert_eq!(backend.model_name(), "gemini-pro");
        assert_eq!(
            backend.generate_url(),
            "http://localhost:9999/v1beta/models/gemini-pro:generateContent"
        );
    }
}

//! Response generation trait

use async_trait::async_trait;

use crate::GenerationOutcome;

/// Text generation behind a fixed persona
///
/// Implementations:
/// - `GeminiBackend` - Google Gemini `generateContent`
///
/// Unlike the speech traits this one is infallible: any failure degrades to a
/// [`crate::SoftFailure`] so the user still gets a spoken answer.
#[async_trait]
pub trait ResponseGenerator: Send + Sync + 'static {
    /// Generate a reply to `user_text`
    async fn generate(&self, user_text: &str) -> GenerationOutcome;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}

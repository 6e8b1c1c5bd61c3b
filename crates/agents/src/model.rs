use async_trait::async_trait;

use crate::error::GenerateError;

/// A text-completion backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Backend name, e.g. `"ollama"`.
    fn name(&self) -> &str;

    /// Model identifier sent to the backend.
    fn id(&self) -> &str;

    /// Complete `prompt` in one non-streaming request and return the text.
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

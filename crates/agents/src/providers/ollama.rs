//! Client for Ollama's non-streaming `/api/generate` endpoint.

use std::time::Duration;

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    tracing::{debug, info},
};

use crate::{error::GenerateError, model::LlmProvider};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama2-uncensored";

pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

impl OllamaProvider {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Bound the whole request, including generation time on the server.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, GenerateError> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GenerateError::Client)?;
        Ok(self)
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn id(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let url = self.endpoint();
        let req = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };
        debug!(
            url = %url,
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "sending generate request"
        );

        let http_err = |source| GenerateError::Http {
            url: url.clone(),
            source,
        };
        let response = self
            .client
            .post(&url)
            .json(&req)
            .send()
            .await
            .map_err(http_err)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Status {
                url: url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await.map_err(http_err)?;
        let text = parsed
            .response
            .ok_or_else(|| GenerateError::MissingResponse { url: url.clone() })?;

        info!(model = %self.model, chars = text.chars().count(), "generation complete");
        Ok(text.trim().to_string())
    }
}

/// Ollama embeddings provider using the batch `/api/embed` endpoint.
use async_trait::async_trait;
use {
    serde::{Deserialize, Serialize},
    sha2::{Digest, Sha256},
    tracing::debug,
};

use crate::embeddings::EmbeddingProvider;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

pub struct OllamaEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dims: usize,
    provider_key: String,
}

fn compute_provider_key(base_url: &str, model: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"ollama:");
    hasher.update(base_url.as_bytes());
    hasher.update(b":");
    hasher.update(model.as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}

impl OllamaEmbeddingProvider {
    pub fn new(model: impl Into<String>) -> Self {
        let base_url = DEFAULT_OLLAMA_URL.to_string();
        let model = model.into();
        let provider_key = compute_provider_key(&base_url, &model);
        Self {
            client: reqwest::Client::new(),
            base_url,
            model,
            dims: 0,
            provider_key,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self.provider_key = compute_provider_key(&self.base_url, &self.model);
        self
    }

    /// Declare the vector width up front. Ollama only reveals it in responses.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dims = dims;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/api/embed", self.base_url)
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        if vectors.len() != 1 {
            anyhow::bail!("ollama returned {} embeddings for one input", vectors.len());
        }
        Ok(vectors.remove(0))
    }

    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(model = %self.model, count = texts.len(), "requesting ollama embeddings");

        let req = EmbedRequest {
            model: &self.model,
            input: texts,
        };
        let response = self.client.post(self.endpoint()).json(&req).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("ollama embeddings request failed with {status}: {body}");
        }

        let resp: EmbedResponse = response.json().await?;
        Ok(resp.embeddings)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn provider_key(&self) -> &str {
        &self.provider_key
    }
}

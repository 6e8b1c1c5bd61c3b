//! Config schema. Every section has defaults, so an empty file (or no file)
//! reproduces the stock pipeline: `./company_docs`, 1000-character chunks,
//! `llama2:7b` embeddings, top-3 retrieval and `llama2-uncensored` generation
//! on a local Ollama.

use std::path::PathBuf;

use {
    secrecy::Secret,
    serde::{Deserialize, Serialize},
};

use crate::error::{ConfigError, Result};

/// Prompt used when the config does not override it. `{context}` receives the
/// retrieved chunks; `{query}` (optional) receives the retrieval query.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "\nYou are a customer (impatient tone).\nHere is some info that might help you ask questions:\n{context}\n\nGenerate 5 challenging customer questions.\n";

/// Prompt used to answer each generated question with `run --answer`.
pub const DEFAULT_ANSWER_TEMPLATE: &str = "\nYou are a helpful support agent for this company.\nAnswer the customer's question using only this info:\n{context}\n\nQuestion: {query}\nAnswer:";

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RaglineConfig {
    pub docs: DocsConfig,
    pub chunking: ChunkingConfig,
    pub embeddings: EmbeddingsConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
    pub prompt: PromptConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    /// Directory scanned recursively for documents.
    pub dir: PathBuf,
    /// File extensions to load, without the dot. Empty loads every non-hidden file.
    pub extensions: Vec<String>,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./company_docs"),
            extensions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    #[default]
    Ollama,
    OpenAi,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingsConfig {
    pub provider: EmbeddingProviderKind,
    pub base_url: String,
    pub model: String,
    /// Only read by the `openai` provider. Never written back out.
    #[serde(skip_serializing)]
    pub api_key: Option<Secret<String>>,
    /// Vector width reported by the provider before the first response.
    pub dimensions: Option<usize>,
    /// Texts sent per embedding request.
    pub batch_size: usize,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Ollama,
            base_url: DEFAULT_OLLAMA_URL.into(),
            model: "llama2:7b".into(),
            api_key: None,
            dimensions: None,
            batch_size: 32,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    Cosine,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub distance: DistanceMetric,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            distance: DistanceMetric::Euclidean,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.into(),
            model: "llama2-uncensored".into(),
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Retrieval query; also available to the template as `{query}`.
    pub query: String,
    pub template: String,
    /// Template for answering generated questions. `{query}` is the question.
    pub answer_template: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            query: "Generate 5 challenging customer questions".into(),
            template: DEFAULT_PROMPT_TEMPLATE.into(),
            answer_template: DEFAULT_ANSWER_TEMPLATE.into(),
        }
    }
}

impl RaglineConfig {
    /// Reject combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let chunking = &self.chunking;
        if chunking.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunking.chunk_size must be > 0".into()));
        }
        if chunking.chunk_overlap >= chunking.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                chunking.chunk_overlap, chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::Invalid("retrieval.top_k must be > 0".into()));
        }
        if self.embeddings.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "embeddings.batch_size must be > 0".into(),
            ));
        }
        if !self.prompt.template.contains("{context}") {
            return Err(ConfigError::Invalid(
                "prompt.template must contain a {context} placeholder".into(),
            ));
        }
        let answer = &self.prompt.answer_template;
        if !answer.contains("{context}") || !answer.contains("{query}") {
            return Err(ConfigError::Invalid(
                "prompt.answer_template must contain {context} and {query} placeholders".into(),
            ));
        }
        if self.embeddings.provider == EmbeddingProviderKind::OpenAi
            && self.embeddings.api_key.is_none()
        {
            return Err(ConfigError::Invalid(
                "embeddings.api_key is required for the openai provider".into(),
            ));
        }
        Ok(())
    }

    /// Render the effective config as TOML. The API key is left out.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

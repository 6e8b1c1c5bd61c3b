//! Configuration for the ragline pipeline: typed schema, TOML loading and validation.

pub mod error;
pub mod loader;
pub mod schema;

pub use {
    error::{ConfigError, Result},
    loader::{CONFIG_FILE_NAME, config_dir, discover_and_load, find_config_file, load_config},
    schema::{
        ChunkingConfig, DEFAULT_ANSWER_TEMPLATE, DEFAULT_PROMPT_TEMPLATE, DistanceMetric,
        DocsConfig, EmbeddingProviderKind, EmbeddingsConfig, GenerationConfig, PromptConfig,
        RaglineConfig, RetrievalConfig,
    },
};

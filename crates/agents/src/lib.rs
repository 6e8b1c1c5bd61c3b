//! Generation side of the pipeline: prompt assembly, the local model client,
//! and parsing of the generated questions.

pub mod error;
pub mod model;
pub mod prompt;
pub mod providers;
pub mod questions;

pub use {
    error::GenerateError,
    model::LlmProvider,
    prompt::PromptTemplate,
    providers::ollama::OllamaProvider,
    questions::parse_questions,
};

//! Document memory: text files → chunked → embedded → exact nearest-neighbour search in memory.

pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod embeddings_ollama;
pub mod embeddings_openai;
pub mod loader;
pub mod manager;
pub mod search;
pub mod store;

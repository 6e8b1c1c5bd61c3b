use std::path::PathBuf;

use crate::store::Distance;

/// Configuration for the document memory.
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Directory scanned recursively for documents.
    pub docs_dir: PathBuf,
    /// Extensions to load (without the dot). Empty means every non-hidden file.
    pub extensions: Vec<String>,
    /// Maximum chunk length, counted in characters.
    pub chunk_size: usize,
    /// Characters carried over from one chunk into the next.
    pub chunk_overlap: usize,
    /// Texts per embedding request.
    pub batch_size: usize,
    /// Metric used to rank chunks against the query.
    pub distance: Distance,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("company_docs"),
            extensions: Vec::new(),
            chunk_size: 1000,
            chunk_overlap: 200,
            batch_size: 32,
            distance: Distance::Euclidean,
        }
    }
}

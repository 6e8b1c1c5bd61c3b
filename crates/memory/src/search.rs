use std::path::PathBuf;

use {serde::Serialize, tracing::debug};

use crate::{embeddings::EmbeddingProvider, store::VectorStore};

/// Separator between retrieved chunks in the assembled context.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// A single retrieved chunk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub path: PathBuf,
    /// Position of the chunk within its document.
    pub chunk_index: usize,
    pub text: String,
    pub distance: f32,
}

/// Embed `query` and return the `limit` nearest chunks, closest first.
///
/// An empty store short-circuits without calling the embedder.
pub async fn vector_search(
    store: &dyn VectorStore,
    embedder: &dyn EmbeddingProvider,
    query: &str,
    limit: usize,
) -> anyhow::Result<Vec<SearchResult>> {
    if store.is_empty() || limit == 0 {
        return Ok(Vec::new());
    }

    let query_vec = embedder.embed(query).await?;
    let hits = store.search(&query_vec, limit)?;
    debug!(query, hits = hits.len(), "vector search");

    Ok(hits
        .into_iter()
        .map(|hit| SearchResult {
            path: hit.chunk.source,
            chunk_index: hit.chunk.index,
            text: hit.chunk.text,
            distance: hit.distance,
        })
        .collect())
}

/// Concatenate result texts in rank order.
pub fn join_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Memory manager: orchestrates loading, chunking, embedding, and search.
use tracing::{debug, info};

use crate::{
    chunker::{TextSplitter, split_documents},
    config::MemoryConfig,
    embeddings::{EmbeddingProvider, embed_in_batches},
    loader::load_documents,
    search::{self, SearchResult},
    store::VectorStore,
};

pub struct MemoryManager {
    config: MemoryConfig,
    store: Box<dyn VectorStore>,
    embedder: Box<dyn EmbeddingProvider>,
}

/// Status info about the index.
#[derive(Debug, Clone)]
pub struct MemoryStatus {
    pub total_chunks: usize,
    pub dimensions: Option<usize>,
    pub embedding_model: String,
}

/// Index report.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexReport {
    pub documents: usize,
    pub chunks: usize,
    /// Files that could not be read or decoded.
    pub skipped_files: usize,
}

impl MemoryManager {
    pub fn new(
        config: MemoryConfig,
        store: Box<dyn VectorStore>,
        embedder: Box<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            config,
            store,
            embedder,
        }
    }

    /// Load every document under the configured directory, split it, embed the
    /// chunks and add them to the store.
    pub async fn index(&mut self) -> anyhow::Result<IndexReport> {
        let loaded = load_documents(&self.config.docs_dir, &self.config.extensions).await?;

        let splitter = TextSplitter::new(self.config.chunk_size, self.config.chunk_overlap);
        let chunks = split_documents(&loaded.documents, &splitter);
        debug!(
            chunks = chunks.len(),
            chunk_size = splitter.chunk_size(),
            chunk_overlap = splitter.chunk_overlap(),
            "split documents"
        );

        let report = IndexReport {
            documents: loaded.documents.len(),
            chunks: chunks.len(),
            skipped_files: loaded.skipped,
        };
        if chunks.is_empty() {
            info!(dir = %self.config.docs_dir.display(), "no chunks to index");
            return Ok(report);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors =
            embed_in_batches(self.embedder.as_ref(), &texts, self.config.batch_size).await?;
        self.store.add(chunks, vectors)?;

        info!(
            documents = report.documents,
            chunks = report.chunks,
            model = %self.embedder.model_name(),
            "indexed documents"
        );
        Ok(report)
    }

    /// Nearest chunks to `query`, closest first.
    pub async fn search(&self, query: &str, limit: usize) -> anyhow::Result<Vec<SearchResult>> {
        search::vector_search(self.store.as_ref(), self.embedder.as_ref(), query, limit).await
    }

    /// Search and join the hits into one context string.
    pub async fn context(
        &self,
        query: &str,
        limit: usize,
    ) -> anyhow::Result<(Vec<SearchResult>, String)> {
        let results = self.search(query, limit).await?;
        let context = search::join_context(&results);
        Ok((results, context))
    }

    pub fn status(&self) -> MemoryStatus {
        MemoryStatus {
            total_chunks: self.store.len(),
            dimensions: self.store.dimensions(),
            embedding_model: self.embedder.model_name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use {
        super::*,
        crate::store::{Distance, InMemoryVectorStore},
        async_trait::async_trait,
        tempfile::TempDir,
    };

    /// Mock embedding provider that produces deterministic vectors from content.
    ///
    /// Each of 8 dimensions corresponds to a keyword: 1.0 if the text contains
    /// it, 0.0 otherwise. Enough for vector search to separate topics.
    struct MockEmbedder;

    const KEYWORDS: [&str; 8] = [
        "refund", "shipping", "warranty", "pricing", "support", "account", "cooking", "music",
    ];

    fn keyword_embedding(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        KEYWORDS
            .iter()
            .map(|kw| if lower.contains(kw) { 1.0 } else { 0.0 })
            .collect()
    }

    #[async_trait]
    impl EmbeddingProvider for MockEmbedder {
        async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            Ok(keyword_embedding(text))
        }

        fn model_name(&self) -> &str {
            "mock-model"
        }

        fn dimensions(&self) -> usize {
            8
        }
    }

    fn setup(distance: Distance) -> (MemoryManager, TempDir) {
        let tmp = TempDir::new().unwrap();
        let docs_dir = tmp.path().join("company_docs");
        std::fs::create_dir_all(&docs_dir).unwrap();

        let config = MemoryConfig {
            docs_dir,
            extensions: Vec::new(),
            chunk_size: 80,
            chunk_overlap: 10,
            batch_size: 4,
            distance,
        };

        let store = Box::new(InMemoryVectorStore::new(distance));
        (MemoryManager::new(config, store, Box::new(MockEmbedder)), tmp)
    }

    #[tokio::test]
    async fn index_and_search() {
        let (mut manager, tmp) = setup(Distance::Euclidean);
        let docs = tmp.path().join("company_docs");
        std::fs::write(
            docs.join("refunds.txt"),
            "Refund requests are processed within 14 days of receiving the item.",
        )
        .unwrap();

        let report = manager.index().await.unwrap();
        assert_eq!(report, IndexReport {
            documents: 1,
            chunks: 1,
            skipped_files: 0,
        });

        let status = manager.status();
        assert_eq!(status.total_chunks, 1);
        assert_eq!(status.dimensions, Some(8));
        assert_eq!(status.embedding_model, "mock-model");

        let results = manager.search("refund", 3).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].text.contains("14 days"));
    }

    #[tokio::test]
    async fn multi_file_topic_separation() {
        let (mut manager, tmp) = setup(Distance::Cosine);
        let docs = tmp.path().join("company_docs");
        std::fs::write(
            docs.join("shipping.txt"),
            "Shipping is free on orders over $50. Express shipping costs $15.",
        )
        .unwrap();
        std::fs::write(
            docs.join("warranty.txt"),
            "Every device carries a two year warranty against defects.",
        )
        .unwrap();
        std::fs::write(
            docs.join("support.txt"),
            "Support is available by phone and chat from 8am to 8pm.",
        )
        .unwrap();
        manager.index().await.unwrap();
        assert_eq!(manager.status().total_chunks, 3);

        for (query, file) in [
            ("shipping", "shipping.txt"),
            ("warranty", "warranty.txt"),
            ("support", "support.txt"),
        ] {
            let results = manager.search(query, 3).await.unwrap();
            assert!(
                results[0].path.ends_with(file),
                "top result for {query:?} should come from {file}, got {}",
                results[0].path.display()
            );
        }
    }

    #[tokio::test]
    async fn context_joins_top_k_in_rank_order() {
        let (mut manager, tmp) = setup(Distance::Euclidean);
        let docs = tmp.path().join("company_docs");
        std::fs::write(docs.join("a.txt"), "pricing starts at $5 per seat").unwrap();
        std::fs::write(docs.join("b.txt"), "pricing and refund rules differ by plan").unwrap();
        std::fs::write(docs.join("c.txt"), "we love music on fridays").unwrap();
        manager.index().await.unwrap();

        let (results, context) = manager.context("pricing refund", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(
            context,
            "pricing and refund rules differ by plan\n\npricing starts at $5 per seat"
        );
    }

    #[tokio::test]
    async fn long_document_is_split_into_bounded_chunks() {
        let (mut manager, tmp) = setup(Distance::Euclidean);
        let docs = tmp.path().join("company_docs");
        let body: String = (0..40)
            .map(|i| format!("Line {i} covers account settings.\n"))
            .collect();
        std::fs::write(docs.join("accounts.md"), &body).unwrap();

        let report = manager.index().await.unwrap();
        assert!(report.chunks > 1, "expected several chunks, got {}", report.chunks);

        let results = manager.search("account", 100).await.unwrap();
        assert_eq!(results.len(), report.chunks);
        assert!(results.iter().all(|r| r.text.chars().count() <= 80));
        assert!(results.iter().all(|r| r.path.ends_with("accounts.md")));
    }

    #[tokio::test]
    async fn empty_directory_indexes_nothing() {
        let (mut manager, _tmp) = setup(Distance::Euclidean);
        let report = manager.index().await.unwrap();
        assert_eq!(report, IndexReport::default());
        assert!(manager.search("refund", 3).await.unwrap().is_empty());
        assert_eq!(manager.status().dimensions, None);
    }

    #[tokio::test]
    async fn missing_directory_fails() {
        let (mut manager, tmp) = setup(Distance::Euclidean);
        std::fs::remove_dir_all(tmp.path().join("company_docs")).unwrap();
        assert!(manager.index().await.is_err());
    }
}

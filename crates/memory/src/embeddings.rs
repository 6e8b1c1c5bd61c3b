use async_trait::async_trait;

/// Turns text into vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    /// Embed several texts. The default calls [`embed`](Self::embed) once per text.
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn model_name(&self) -> &str;

    /// Vector width, or 0 when it is only known after the first response.
    fn dimensions(&self) -> usize;

    /// Stable identifier of provider + endpoint + model.
    fn provider_key(&self) -> &str {
        self.model_name()
    }
}

/// Embed `texts` in requests of at most `batch_size` texts each.
///
/// Fails if the provider returns a different number of vectors than it was sent.
pub async fn embed_in_batches(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    batch_size: usize,
) -> anyhow::Result<Vec<Vec<f32>>> {
    let mut out = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size.max(1)) {
        let vectors = provider.embed_batch(batch).await?;
        if vectors.len() != batch.len() {
            anyhow::bail!(
                "embedding provider {} returned {} vectors for {} inputs",
                provider.model_name(),
                vectors.len(),
                batch.len()
            );
        }
        out.extend(vectors);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use {
        super::*,
        std::sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    /// Records batch sizes and returns each text's length as a 1-d vector.
    #[derive(Default)]
    struct LengthEmbedder {
        batches: Mutex<Vec<usize>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for LengthEmbedder {
        async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![text.len() as f32])
        }

        async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            self.batches.lock().unwrap().push(texts.len());
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }

        fn model_name(&self) -> &str {
            "length"
        }

        fn dimensions(&self) -> usize {
            1
        }
    }

    struct ShortEmbedder;

    #[async_trait]
    impl EmbeddingProvider for ShortEmbedder {
        async fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
            Ok(vec![0.0])
        }

        async fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(vec![vec![0.0]])
        }

        fn model_name(&self) -> &str {
            "short"
        }

        fn dimensions(&self) -> usize {
            1
        }
    }

    struct SingleEmbedder;

    #[async_trait]
    impl EmbeddingProvider for SingleEmbedder {
        async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            Ok(vec![text.chars().count() as f32, 1.0])
        }

        fn model_name(&self) -> &str {
            "single"
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| "x".repeat(i + 1)).collect()
    }

    #[tokio::test]
    async fn batches_respect_batch_size_and_order() {
        let embedder = LengthEmbedder::default();
        let vectors = embed_in_batches(&embedder, &texts(7), 3).await.unwrap();

        assert_eq!(*embedder.batches.lock().unwrap(), vec![3, 3, 1]);
        let lens: Vec<f32> = vectors.iter().map(|v| v[0]).collect();
        assert_eq!(lens, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_input_sends_nothing() {
        let embedder = LengthEmbedder::default();
        let vectors = embed_in_batches(&embedder, &[], 8).await.unwrap();
        assert!(vectors.is_empty());
        assert!(embedder.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn count_mismatch_is_an_error() {
        let err = embed_in_batches(&ShortEmbedder, &texts(2), 8)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("returned 1 vectors for 2 inputs"));
    }

    #[tokio::test]
    async fn default_batch_embeds_one_by_one() {
        let vectors = SingleEmbedder
            .embed_batch(&["ab".into(), "abcd".into()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![2.0, 1.0], vec![4.0, 1.0]]);
        assert_eq!(SingleEmbedder.provider_key(), "single");
    }
}

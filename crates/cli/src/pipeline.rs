//! Wires config into the load → split → embed → retrieve → generate pipeline.

use std::time::Duration;

use {
    ragline_agents::{LlmProvider, OllamaProvider, PromptTemplate, parse_questions},
    ragline_config::{DistanceMetric, EmbeddingProviderKind, EmbeddingsConfig, RaglineConfig},
    ragline_memory::{
        config::MemoryConfig,
        embeddings::EmbeddingProvider,
        embeddings_ollama::OllamaEmbeddingProvider,
        embeddings_openai::OpenAiEmbeddingProvider,
        manager::{IndexReport, MemoryManager},
        search::SearchResult,
        store::{Distance, InMemoryVectorStore},
    },
    serde::{Deserialize, Serialize},
    tracing::{debug, info},
};

pub struct Pipeline {
    memory: MemoryManager,
    llm: Box<dyn LlmProvider>,
    template: PromptTemplate,
    answer_template: PromptTemplate,
}

/// Retrieved chunks and the context string built from them.
#[derive(Debug)]
pub struct Retrieval {
    pub results: Vec<SearchResult>,
    pub context: String,
}

/// A generated question and the model's answer to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// Everything a full run produced.
#[derive(Debug, Serialize)]
pub struct RunOutput {
    pub prompt: String,
    pub response: String,
    pub questions: Vec<String>,
    /// Empty unless the run was asked to answer its questions.
    pub qa_pairs: Vec<QaPair>,
    pub model: String,
}

fn memory_config(config: &RaglineConfig) -> MemoryConfig {
    MemoryConfig {
        docs_dir: config.docs.dir.clone(),
        extensions: config.docs.extensions.clone(),
        chunk_size: config.chunking.chunk_size,
        chunk_overlap: config.chunking.chunk_overlap,
        batch_size: config.embeddings.batch_size,
        distance: match config.retrieval.distance {
            DistanceMetric::Euclidean => Distance::Euclidean,
            DistanceMetric::Cosine => Distance::Cosine,
        },
    }
}

fn build_embedder(config: &EmbeddingsConfig) -> anyhow::Result<Box<dyn EmbeddingProvider>> {
    Ok(match config.provider {
        EmbeddingProviderKind::Ollama => {
            let mut provider =
                OllamaEmbeddingProvider::new(&config.model).with_base_url(&config.base_url);
            if let Some(dims) = config.dimensions {
                provider = provider.with_dimensions(dims);
            }
            Box::new(provider)
        },
        EmbeddingProviderKind::OpenAi => {
            let Some(api_key) = config.api_key.clone() else {
                anyhow::bail!("embeddings.api_key is required for the openai provider");
            };
            Box::new(
                OpenAiEmbeddingProvider::new(api_key)
                    .with_base_url(&config.base_url)
                    .with_model(&config.model, config.dimensions.unwrap_or(0)),
            )
        },
    })
}

impl Pipeline {
    pub fn from_config(config: &RaglineConfig) -> anyhow::Result<Self> {
        let embedder = build_embedder(&config.embeddings)?;
        let llm = OllamaProvider::new(&config.generation.model)
            .with_base_url(&config.generation.base_url)
            .with_timeout(Duration::from_secs(config.generation.timeout_secs))?;
        Ok(Self::with_parts(config, embedder, Box::new(llm)))
    }

    pub fn with_parts(
        config: &RaglineConfig,
        embedder: Box<dyn EmbeddingProvider>,
        llm: Box<dyn LlmProvider>,
    ) -> Self {
        let memory_config = memory_config(config);
        let store = Box::new(InMemoryVectorStore::new(memory_config.distance));
        Self {
            memory: MemoryManager::new(memory_config, store, embedder),
            llm,
            template: PromptTemplate::new(&config.prompt.template),
            answer_template: PromptTemplate::new(&config.prompt.answer_template),
        }
    }

    pub async fn index(&mut self) -> anyhow::Result<IndexReport> {
        self.memory.index().await
    }

    pub async fn retrieve(&self, query: &str, top_k: usize) -> anyhow::Result<Retrieval> {
        let (results, context) = self.memory.context(query, top_k).await?;
        Ok(Retrieval { results, context })
    }

    pub fn build_prompt(&self, context: &str, query: &str) -> String {
        self.template.render(context, query)
    }

    /// Retrieve, prompt, and generate. Call [`index`](Self::index) first.
    ///
    /// With `answer`, every parsed question is answered in turn from its own
    /// retrieved context.
    pub async fn run(
        &self,
        query: &str,
        top_k: usize,
        answer: bool,
    ) -> anyhow::Result<RunOutput> {
        let retrieval = self.retrieve(query, top_k).await?;
        if retrieval.results.is_empty() {
            tracing::warn!("no chunks retrieved, prompting with empty context");
        }
        let prompt = self.build_prompt(&retrieval.context, query);

        info!(
            provider = self.llm.name(),
            model = self.llm.id(),
            chunks = retrieval.results.len(),
            "generating"
        );
        let response = self.llm.generate(&prompt).await?;
        let questions = parse_questions(&response);

        let mut qa_pairs = Vec::new();
        if answer {
            for question in &questions {
                qa_pairs.push(self.answer(question, top_k).await?);
            }
            info!(answered = qa_pairs.len(), "answered generated questions");
        }

        Ok(RunOutput {
            prompt,
            response,
            questions,
            qa_pairs,
            model: self.llm.id().to_string(),
        })
    }

    /// Answer one question from the chunks closest to it.
    pub async fn answer(&self, question: &str, top_k: usize) -> anyhow::Result<QaPair> {
        let retrieval = self.retrieve(question, top_k).await?;
        let prompt = self.answer_template.render(&retrieval.context, question);
        debug!(question, chunks = retrieval.results.len(), "answering question");
        let answer = self.llm.generate(&prompt).await?;
        Ok(QaPair {
            question: question.to_string(),
            answer,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use {
        super::*,
        axum::{Json, Router, routing::post},
        serde_json::{Value, json},
        std::sync::{Arc, Mutex},
        tempfile::TempDir,
    };

    /// Stand-in for a local Ollama: keyword embeddings plus a canned reply
    /// that records the prompt it was sent.
    async fn fake_ollama(prompts: Arc<Mutex<Vec<String>>>) -> String {
        fn embed(text: &str) -> Vec<f32> {
            let lower = text.to_lowercase();
            ["refund", "shipping", "warranty"]
                .iter()
                .map(|kw| if lower.contains(kw) { 1.0 } else { 0.0 })
                .collect()
        }

        let app = Router::new()
            .route(
                "/api/embed",
                post(|Json(body): Json<Value>| async move {
                    let embeddings: Vec<Vec<f32>> = body["input"]
                        .as_array()
                        .unwrap()
                        .iter()
                        .map(|t| embed(t.as_str().unwrap()))
                        .collect();
                    Json(json!({ "embeddings": embeddings }))
                }),
            )
            .route(
                "/api/generate",
                post(move |Json(body): Json<Value>| {
                    let prompts = Arc::clone(&prompts);
                    async move {
                        let prompt = body["prompt"].as_str().unwrap().to_string();
                        let response = match prompt.split_once("Question: ") {
                            Some((_, rest)) => {
                                format!("ANSWER TO {}", rest.lines().next().unwrap_or(""))
                            },
                            None => {
                                "1. Where is my refund?\n2. Why does shipping take so long?"
                                    .to_string()
                            },
                        };
                        prompts.lock().unwrap().push(prompt);
                        Json(json!({ "response": response, "done": true }))
                    }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn write_docs(tmp: &TempDir) -> RaglineConfig {
        let docs = tmp.path().join("company_docs");
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::write(docs.join("refunds.txt"), "Refund requests take 14 days.").unwrap();
        std::fs::write(docs.join("shipping.txt"), "Shipping is free over $50.").unwrap();
        std::fs::write(docs.join("warranty.txt"), "Warranty lasts one year.").unwrap();

        let mut config = RaglineConfig::default();
        config.docs.dir = docs;
        config
    }

    #[tokio::test]
    async fn full_run_against_local_server() {
        let tmp = TempDir::new().unwrap();
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let base = fake_ollama(Arc::clone(&prompts)).await;

        let mut config = write_docs(&tmp);
        config.embeddings.base_url = base.clone();
        config.generation.base_url = base;
        config.retrieval.top_k = 2;
        config.prompt.query = "refund".into();

        let mut pipeline = Pipeline::from_config(&config).unwrap();
        let report = pipeline.index().await.unwrap();
        assert_eq!(report.documents, 3);
        assert_eq!(report.chunks, 3);

        let output = pipeline
            .run(&config.prompt.query, config.retrieval.top_k, false)
            .await
            .unwrap();
        assert_eq!(output.model, "llama2-uncensored");
        assert_eq!(output.questions, vec![
            "Where is my refund?",
            "Why does shipping take so long?"
        ]);

        let sent = prompts.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], output.prompt);
        assert!(sent[0].starts_with("\nYou are a customer (impatient tone).\n"));
        // The refund chunk ranks first, then ties keep file order.
        assert!(sent[0].contains("Refund requests take 14 days.\n\nShipping is free over $50."));
        assert!(!sent[0].contains("Warranty"));
        assert!(output.qa_pairs.is_empty());
    }

    #[tokio::test]
    async fn answer_mode_answers_each_question_from_its_own_context() {
        let tmp = TempDir::new().unwrap();
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let base = fake_ollama(Arc::clone(&prompts)).await;

        let mut config = write_docs(&tmp);
        config.embeddings.base_url = base.clone();
        config.generation.base_url = base;

        let mut pipeline = Pipeline::from_config(&config).unwrap();
        pipeline.index().await.unwrap();

        let output = pipeline.run("refund", 1, true).await.unwrap();
        assert_eq!(output.qa_pairs, vec![
            QaPair {
                question: "Where is my refund?".into(),
                answer: "ANSWER TO Where is my refund?".into(),
            },
            QaPair {
                question: "Why does shipping take so long?".into(),
                answer: "ANSWER TO Why does shipping take so long?".into(),
            },
        ]);

        let sent = prompts.lock().unwrap();
        assert_eq!(sent.len(), 3);
        assert!(sent[1].contains("Refund requests take 14 days."));
        assert!(sent[2].contains("Shipping is free over $50."));
        assert!(!sent[2].contains("Refund requests"));
    }

    #[tokio::test]
    async fn retrieve_without_generation() {
        let tmp = TempDir::new().unwrap();
        let base = fake_ollama(Arc::default()).await;
        let mut config = write_docs(&tmp);
        config.embeddings.base_url = base.clone();
        config.generation.base_url = base;

        let mut pipeline = Pipeline::from_config(&config).unwrap();
        pipeline.index().await.unwrap();

        let retrieval = pipeline.retrieve("warranty", 1).await.unwrap();
        assert_eq!(retrieval.results.len(), 1);
        assert_eq!(retrieval.context, "Warranty lasts one year.");

        let prompt = pipeline.build_prompt(&retrieval.context, "warranty");
        assert!(prompt.contains("questions:\nWarranty lasts one year.\n\nGenerate 5"));
    }

    #[test]
    fn openai_embeddings_need_a_key() {
        let mut config = RaglineConfig::default();
        config.embeddings.provider = EmbeddingProviderKind::OpenAi;
        assert!(Pipeline::from_config(&config).is_err());
    }

    #[test]
    fn memory_config_follows_settings() {
        let mut config = RaglineConfig::default();
        config.retrieval.distance = DistanceMetric::Cosine;
        config.chunking.chunk_size = 256;
        let memory = memory_config(&config);
        assert_eq!(memory.distance, Distance::Cosine);
        assert_eq!(memory.chunk_size, 256);
        assert_eq!(memory.chunk_overlap, 200);
        assert_eq!(memory.batch_size, 32);
    }
}

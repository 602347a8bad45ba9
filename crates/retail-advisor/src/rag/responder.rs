//! Domain responders: one CSV-backed index plus a model per retail domain.
//!
//! A responder loads its LanceDB index when one exists and otherwise builds it
//! from the domain's CSV (row -> document -> chunks -> embeddings). Answers use
//! the "stuff" strategy: the top-k retrieved chunks are inlined into one prompt.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AdvisorConfig;
use crate::embeddings::{EmbeddingModel, OllamaEmbeddings};
use crate::llm::{GenerationConfig, LLMProvider, OllamaClient, OllamaProvider};
use crate::processing::{load_csv, TextChunker};
use crate::storage::LanceStore;
use crate::types::{ChunkRecord, Domain};

/// Seam the supervisor dispatches over.
#[async_trait]
pub trait Responder: Send + Sync {
    fn domain(&self) -> Domain;

    /// Answer `question`, prefixed with the domain's response header.
    async fn answer(&self, question: &str) -> Result<String>;
}

/// Prefix a model answer with the domain header the formatter splits on.
pub fn with_response_header(domain: Domain, answer: &str) -> String {
    format!("{}\n\n{}", domain.response_header(), answer)
}

pub struct DomainResponder {
    domain: Domain,
    store: LanceStore,
    embedder: Arc<dyn EmbeddingModel>,
    llm: Arc<dyn LLMProvider>,
    generation: GenerationConfig,
    top_k: usize,
    vectors: usize,
}

impl DomainResponder {
    /// Load the domain's index, building it from the CSV when it is missing
    /// or when `rebuild` is set.
    pub async fn initialize(
        domain: Domain,
        config: &AdvisorConfig,
        embedder: Arc<dyn EmbeddingModel>,
        llm: Arc<dyn LLMProvider>,
        rebuild: bool,
    ) -> Result<Self> {
        let index_path = config.index_path(domain);
        tracing::info!(domain = %domain, index = %index_path.display(), "Initializing responder");

        let store = LanceStore::open(&index_path, embedder.dimension()).await?;

        let vectors = if !rebuild && store.exists().await? {
            let count = store.count().await?;
            tracing::info!(domain = %domain, vectors = count, "Loaded existing index");
            count
        } else {
            if rebuild {
                tracing::info!(domain = %domain, "Rebuild requested, re-indexing dataset");
            } else {
                tracing::warn!(domain = %domain, "Index not found, creating new one");
            }
            let chunker = TextChunker::from_config(&config.chunking);
            build_index(
                &store,
                &config.dataset_path(domain),
                &chunker,
                embedder.as_ref(),
                config.embedding.batch_size,
            )
            .await
            .with_context(|| format!("Failed to build {} index", domain))?
        };

        Ok(Self {
            domain,
            store,
            embedder,
            llm,
            generation: GenerationConfig::from(&config.generation),
            top_k: config.search.top_k,
            vectors,
        })
    }

    /// Wire a responder to the Ollama server described by `config`.
    pub async fn from_config(domain: Domain, config: &AdvisorConfig, rebuild: bool) -> Result<Self> {
        let client = OllamaClient::from_config(&config.ollama)?;
        let embedder = Arc::new(OllamaEmbeddings::new(
            client.clone(),
            config.models.embedding.clone(),
            &config.embedding,
        ));
        let llm = Arc::new(OllamaProvider::new(client, config.models.responder.clone()));
        Self::initialize(domain, config, embedder, llm, rebuild).await
    }

    pub fn vector_count(&self) -> usize {
        self.vectors
    }

    pub fn model_name(&self) -> String {
        self.llm.info().model
    }
}

#[async_trait]
impl Responder for DomainResponder {
    fn domain(&self) -> Domain {
        self.domain
    }

    async fn answer(&self, question: &str) -> Result<String> {
        tracing::info!(domain = %self.domain, question = %question, "Processing query");

        let query_vector = self.embedder.embed_query(question).await?;
        let hits = self.store.vector_search(&query_vector, self.top_k).await?;
        tracing::debug!(
            domain = %self.domain,
            hits = hits.len(),
            top_score = hits.first().map(|h| h.score).unwrap_or(0.0),
            "Retrieved context"
        );

        let context: Vec<String> = hits.into_iter().map(|h| h.text).collect();
        let answer = self
            .llm
            .generate_with_context(question, &context, &self.generation)
            .await
            .with_context(|| format!("{} responder failed to generate an answer", self.domain))?;

        Ok(with_response_header(self.domain, &answer))
    }
}

/// Load, chunk and embed a CSV dataset into `store`. Returns the number of
/// vectors written.
pub async fn build_index(
    store: &LanceStore,
    csv_path: &Path,
    chunker: &TextChunker,
    embedder: &dyn EmbeddingModel,
    batch_size: usize,
) -> Result<usize> {
    tracing::info!(dataset = %csv_path.display(), "Loading documents");
    let documents = load_csv(csv_path)?;
    if documents.is_empty() {
        return Err(anyhow!("Dataset {} contains no data rows", csv_path.display()));
    }
    tracing::info!(documents = documents.len(), "Loaded documents");

    let created_at = chrono::Utc::now().timestamp();
    let mut records = Vec::new();
    for doc in &documents {
        let doc_id = Uuid::new_v4().to_string();
        let metadata_json = serde_json::to_string(&doc.metadata())?;
        for chunk in chunker.chunk(&doc.text) {
            records.push(ChunkRecord {
                id: chunk.id.to_string(),
                doc_id: doc_id.clone(),
                chunk_index: chunk.index as u32,
                text: chunk.text,
                source: doc.source.clone(),
                row: doc.row as u32,
                vector: Vec::new(),
                metadata_json: metadata_json.clone(),
                created_at,
            });
        }
    }
    tracing::info!(chunks = records.len(), "Split documents into chunks");

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} embeddings ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    for batch in records.chunks_mut(batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|r| r.text.clone()).collect();
        let vectors = embedder.embed_documents(&texts).await?;
        if vectors.len() != batch.len() {
            return Err(anyhow!(
                "Embedder returned {} vectors for {} chunks",
                vectors.len(),
                batch.len()
            ));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != store.dimension()) {
            return Err(anyhow!(
                "Embedder returned a {}-dimensional vector, index expects {}",
                bad.len(),
                store.dimension()
            ));
        }
        for (record, vector) in batch.iter_mut().zip(vectors) {
            record.vector = vector;
        }
        pb.inc(batch.len() as u64);
    }
    pb.finish_and_clear();

    let written = store.create_or_replace(records).await?;
    tracing::info!(vectors = written, "Created and stored embeddings");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ProviderInfo;
    use std::io::Write;

    const PRODUCTS: [&str; 3] = ["5321", "9286", "4277"];

    /// One axis per known product id plus a shared bias axis.
    struct KeywordEmbedder;

    fn keyword_vector(text: &str) -> Vec<f32> {
        let mut v: Vec<f32> = PRODUCTS
            .iter()
            .map(|p| if text.contains(p) { 1.0 } else { 0.0 })
            .collect();
        v.push(0.1);
        v
    }

    #[async_trait]
    impl EmbeddingModel for KeywordEmbedder {
        async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
            Ok(keyword_vector(text))
        }

        async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| keyword_vector(t)).collect())
        }

        fn dimension(&self) -> usize {
            PRODUCTS.len() + 1
        }
    }

    /// Returns the prompt it was given so tests can inspect the context.
    struct EchoLlm;

    #[async_trait]
    impl LLMProvider for EchoLlm {
        async fn generate(&self, prompt: &str, _config: &GenerationConfig) -> Result<String> {
            Ok(prompt.to_string())
        }

        fn info(&self) -> ProviderInfo {
            ProviderInfo {
                name: "echo".to_string(),
                model: "echo".to_string(),
                endpoint: String::new(),
                is_local: true,
            }
        }

        async fn is_ready(&self) -> bool {
            true
        }
    }

    fn test_config(root: &Path) -> AdvisorConfig {
        let mut config = AdvisorConfig::default();
        config.data_dir = root.join("indexes");
        config.datasets_dir = root.join("datasets");
        config.embedding.dimension = PRODUCTS.len() + 1;
        config.search.top_k = 1;
        config
    }

    fn write_dataset(config: &AdvisorConfig, domain: Domain) {
        std::fs::create_dir_all(&config.datasets_dir).unwrap();
        let mut file = std::fs::File::create(config.dataset_path(domain)).unwrap();
        writeln!(file, "Product ID,Date,Sales Quantity").unwrap();
        writeln!(file, "5321,2024-10-01,140").unwrap();
        writeln!(file, "9286,2024-10-01,33").unwrap();
        writeln!(file, "4277,2024-10-01,71").unwrap();
    }

    #[test]
    fn test_with_response_header() {
        let text = with_response_header(Domain::InventoryMonitoring, "Reorder 40 units.");
        assert_eq!(text, "📦 Inventory Monitoring Response:\n\nReorder 40 units.");
    }

    #[tokio::test]
    async fn test_builds_index_then_answers_from_retrieved_row() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        write_dataset(&config, Domain::DemandForecasting);

        let responder = DomainResponder::initialize(
            Domain::DemandForecasting,
            &config,
            Arc::new(KeywordEmbedder),
            Arc::new(EchoLlm),
            false,
        )
        .await
        .unwrap();
        assert_eq!(responder.vector_count(), 3);
        assert_eq!(responder.model_name(), "echo");

        let answer = responder
            .answer("What's the forecast demand for product id 5321 next month?")
            .await
            .unwrap();
        assert!(answer.starts_with("📊 Demand Forecasting Response:\n\n"));
        assert!(answer.contains("Product ID: 5321"));
        assert!(!answer.contains("Product ID: 9286"));
    }

    #[tokio::test]
    async fn test_existing_index_is_loaded_without_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        write_dataset(&config, Domain::PriceOptimization);

        DomainResponder::initialize(
            Domain::PriceOptimization,
            &config,
            Arc::new(KeywordEmbedder),
            Arc::new(EchoLlm),
            false,
        )
        .await
        .unwrap();

        std::fs::remove_file(config.dataset_path(Domain::PriceOptimization)).unwrap();

        let reloaded = DomainResponder::initialize(
            Domain::PriceOptimization,
            &config,
            Arc::new(KeywordEmbedder),
            Arc::new(EchoLlm),
            false,
        )
        .await
        .unwrap();
        assert_eq!(reloaded.vector_count(), 3);

        // Forcing a rebuild needs the dataset again
        let rebuilt = DomainResponder::initialize(
            Domain::PriceOptimization,
            &config,
            Arc::new(KeywordEmbedder),
            Arc::new(EchoLlm),
            true,
        )
        .await;
        assert!(rebuilt.is_err());
    }

    #[tokio::test]
    async fn test_emptied_index_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        write_dataset(&config, Domain::InventoryMonitoring);

        DomainResponder::initialize(
            Domain::InventoryMonitoring,
            &config,
            Arc::new(KeywordEmbedder),
            Arc::new(EchoLlm),
            false,
        )
        .await
        .unwrap();

        let store = LanceStore::open(&config.index_path(Domain::InventoryMonitoring), PRODUCTS.len() + 1)
            .await
            .unwrap();
        store.delete_all().await.unwrap();
        assert!(!store.exists().await.unwrap());

        let reloaded = DomainResponder::initialize(
            Domain::InventoryMonitoring,
            &config,
            Arc::new(KeywordEmbedder),
            Arc::new(EchoLlm),
            false,
        )
        .await
        .unwrap();
        assert_eq!(reloaded.vector_count(), 3);
        assert!(store.exists().await.unwrap());
    }

    /// Claims the index dimension but returns shorter vectors.
    struct ShortEmbedder;

    #[async_trait]
    impl EmbeddingModel for ShortEmbedder {
        async fn embed_query(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0])
        }

        async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0]).collect())
        }

        fn dimension(&self) -> usize {
            PRODUCTS.len() + 1
        }
    }

    #[tokio::test]
    async fn test_embedder_dimension_mismatch_fails_build() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        write_dataset(&config, Domain::DemandForecasting);

        let result = DomainResponder::initialize(
            Domain::DemandForecasting,
            &config,
            Arc::new(ShortEmbedder),
            Arc::new(EchoLlm),
            false,
        )
        .await;
        let err = result.err().unwrap();
        assert!(format!("{:#}", err).contains("index expects 4"));
    }

    #[tokio::test]
    async fn test_missing_dataset_fails_initialization() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let result = DomainResponder::initialize(
            Domain::InventoryMonitoring,
            &config,
            Arc::new(KeywordEmbedder),
            Arc::new(EchoLlm),
            false,
        )
        .await;
        let err = result.err().unwrap();
        assert!(format!("{:#}", err).contains("inventory_monitoring.csv"));
    }

    #[tokio::test]
    async fn test_header_only_dataset_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::create_dir_all(&config.datasets_dir).unwrap();
        std::fs::write(config.dataset_path(Domain::DemandForecasting), "Product ID,Price\n").unwrap();

        let result = DomainResponder::initialize(
            Domain::DemandForecasting,
            &config,
            Arc::new(KeywordEmbedder),
            Arc::new(EchoLlm),
            false,
        )
        .await;
        let err = result.err().unwrap();
        assert!(format!("{:#}", err).contains("no data rows"));
    }
}

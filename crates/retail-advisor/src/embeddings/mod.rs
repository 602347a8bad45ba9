pub mod ollama;

pub use ollama::OllamaEmbeddings;

use anyhow::Result;
use async_trait::async_trait;

/// Unified embedding model trait
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Embed a search query
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Batch embed documents for ingestion
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embedding vector dimension
    fn dimension(&self) -> usize;
}

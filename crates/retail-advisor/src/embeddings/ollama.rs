use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

use super::EmbeddingModel;
use crate::config::EmbeddingConfig;
use crate::llm::OllamaClient;

/// Embeddings served by an Ollama embedding model (e.g. `nomic-embed-text`).
pub struct OllamaEmbeddings {
    client: OllamaClient,
    model: String,
    dimension: usize,
    batch_size: usize,
    cache: Mutex<lru::LruCache<String, Vec<f32>>>,
}

impl OllamaEmbeddings {
    pub fn new(client: OllamaClient, model: impl Into<String>, config: &EmbeddingConfig) -> Self {
        let capacity = NonZeroUsize::new(config.cache_size.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            client,
            model: model.into(),
            dimension: config.dimension,
            batch_size: config.batch_size.max(1),
            cache: Mutex::new(lru::LruCache::new(capacity)),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn check_dimensions(&self, vectors: &[Vec<f32>]) -> Result<()> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(anyhow!(
                "Embedding model '{}' returned {} dimensions, expected {} (check embedding.dimension)",
                self.model,
                bad.len(),
                self.dimension
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingModel for OllamaEmbeddings {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let cached = self.cache.lock().get(text).cloned();
        if let Some(cached) = cached {
            return Ok(cached);
        }

        let mut vectors = self.client.embed(&self.model, &[text.to_string()]).await?;
        self.check_dimensions(&vectors)?;
        let embedding = vectors
            .pop()
            .ok_or_else(|| anyhow!("Empty embedding response for query"))?;

        self.cache.lock().put(text.to_string(), embedding.clone());
        Ok(embedding)
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut all = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let vectors = self.client.embed(&self.model, batch).await?;
            self.check_dimensions(&vectors)?;
            all.extend(vectors);
        }
        Ok(all)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

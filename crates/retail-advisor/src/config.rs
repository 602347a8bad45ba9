use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::Domain;

pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://127.0.0.1:11434";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Root directory holding one index folder per responder.
    pub data_dir: PathBuf,
    /// Directory containing the three domain CSV files.
    pub datasets_dir: PathBuf,
    pub ollama: OllamaConfig,
    pub models: ModelConfig,
    pub embedding: EmbeddingConfig,
    pub chunking: ChunkingConfig,
    pub search: SearchConfig,
    pub generation: GenerationSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub endpoint: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub embedding: String,
    /// Model the three domain responders answer with.
    pub responder: String,
    /// Model used to classify incoming questions.
    pub supervisor: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub dimension: usize,
    pub batch_size: usize,
    pub cache_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub min_chunk_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub max_tokens: usize,
    pub temperature: f32,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("embedding.dimension must be > 0")]
    ZeroDimension,
    #[error("embedding.batch_size must be > 0")]
    ZeroBatchSize,
    #[error("chunking.chunk_overlap ({overlap}) must be < chunk_size ({size})")]
    OverlapTooLarge { overlap: usize, size: usize },
    #[error("chunking.min_chunk_size ({min}) must be <= chunk_size ({size})")]
    MinChunkTooLarge { min: usize, size: usize },
    #[error("search.top_k must be > 0")]
    ZeroTopK,
    #[error("models.{0} must not be empty")]
    EmptyModel(&'static str),
    #[error("ollama.endpoint must not be empty")]
    EmptyEndpoint,
    #[error("generation.temperature must be in [0.0, 2.0], got {0}")]
    TemperatureOutOfRange(f32),
}

impl AdvisorConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding.dimension == 0 {
            return Err(ConfigError::ZeroDimension);
        }
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(ConfigError::OverlapTooLarge {
                overlap: self.chunking.chunk_overlap,
                size: self.chunking.chunk_size,
            });
        }
        if self.chunking.min_chunk_size > self.chunking.chunk_size {
            return Err(ConfigError::MinChunkTooLarge {
                min: self.chunking.min_chunk_size,
                size: self.chunking.chunk_size,
            });
        }
        if self.search.top_k == 0 {
            return Err(ConfigError::ZeroTopK);
        }
        if self.models.embedding.trim().is_empty() {
            return Err(ConfigError::EmptyModel("embedding"));
        }
        if self.models.responder.trim().is_empty() {
            return Err(ConfigError::EmptyModel("responder"));
        }
        if self.models.supervisor.trim().is_empty() {
            return Err(ConfigError::EmptyModel("supervisor"));
        }
        if self.ollama.endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::TemperatureOutOfRange(self.generation.temperature));
        }
        Ok(())
    }

    /// Load config from a JSON file, falling back to defaults for missing fields.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn dataset_path(&self, domain: Domain) -> PathBuf {
        self.datasets_dir.join(domain.dataset_file())
    }

    pub fn index_path(&self, domain: Domain) -> PathBuf {
        self.data_dir.join(domain.index_dir())
    }
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        let data_dir = if let Ok(env_path) = std::env::var("RETAIL_ADVISOR_DATA_DIR") {
            PathBuf::from(env_path)
        } else {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("retail-advisor")
        };

        let datasets_dir = std::env::var("RETAIL_ADVISOR_DATASETS")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("datasets"));

        Self {
            data_dir,
            datasets_dir,
            ollama: OllamaConfig::default(),
            models: ModelConfig::default(),
            embedding: EmbeddingConfig::default(),
            chunking: ChunkingConfig::default(),
            search: SearchConfig::default(),
            generation: GenerationSettings::default(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: std::env::var("OLLAMA_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_OLLAMA_ENDPOINT.to_string()),
            request_timeout_secs: 300,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            embedding: "nomic-embed-text".to_string(),
            responder: "tinyllama".to_string(),
            supervisor: "gemma3".to_string(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        // nomic-embed-text produces 768-dimensional vectors
        Self {
            dimension: 768,
            batch_size: 32,
            cache_size: 256,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            min_chunk_size: 1,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.7,
        }
    }
}

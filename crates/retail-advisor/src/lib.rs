pub mod chat;
pub mod config;
pub mod embeddings;
pub mod llm;
pub mod processing;
pub mod rag;
pub mod storage;
pub mod types;

// Re-export primary types for convenience
pub use chat::{ChatEngine, ChatSession, ABOUT_TEXT, EXAMPLE_QUESTIONS};
pub use config::{AdvisorConfig, ConfigError};
pub use rag::{format_response, DomainResponder, Responder, Supervisor};
pub use types::{ChunkRecord, CsvDocument, Domain};

// Re-export LLM types
pub use llm::{GenerationConfig, LLMProvider, OllamaClient, OllamaProvider, OllamaStatus, ProviderInfo};

// Re-export common types
pub use anyhow::{Error, Result};

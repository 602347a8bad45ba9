//! LLM Module - language model access for the supervisor and responders
//! All generation goes through a locally running Ollama server.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod ollama;

pub use ollama::{OllamaClient, OllamaProvider, OllamaStatus};

/// Core trait for LLM providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String>;

    /// Generate an answer grounded in retrieved context
    async fn generate_with_context(
        &self,
        query: &str,
        context: &[String],
        config: &GenerationConfig,
    ) -> Result<String> {
        let prompt = format_rag_prompt(query, context);
        self.generate(&prompt, config).await
    }

    /// Get provider info
    fn info(&self) -> ProviderInfo;

    /// Check if provider is ready
    async fn is_ready(&self) -> bool;
}

/// Generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub max_tokens: usize,
    pub temperature: f32,
    pub stop_sequences: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.7,
            stop_sequences: vec![],
        }
    }
}

impl From<&crate::config::GenerationSettings> for GenerationConfig {
    fn from(settings: &crate::config::GenerationSettings) -> Self {
        Self {
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            stop_sequences: vec![],
        }
    }
}

/// Provider information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub model: String,
    pub endpoint: String,
    pub is_local: bool,
}

/// Format the "stuff" prompt: every retrieved chunk inlined ahead of the question.
pub fn format_rag_prompt(query: &str, context: &[String]) -> String {
    let formatted_context = if context.is_empty() {
        "No matching records were found.".to_string()
    } else {
        context.join("\n\n")
    };

    format!(
        "Use the following pieces of context to answer the question at the end. \
         If you don't know the answer, just say that you don't know, don't try to make up an answer.\
         \n\n{}\n\nQuestion: {}\nHelpful Answer:",
        formatted_context, query
    )
}

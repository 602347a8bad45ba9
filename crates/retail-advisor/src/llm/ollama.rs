//! Ollama HTTP client: generation, embeddings and health probing.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{GenerationConfig, LLMProvider, ProviderInfo};

#[derive(Clone)]
pub struct OllamaClient {
    endpoint: String,
    http: Client,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaStatus {
    pub available: bool,
    pub endpoint: String,
    pub version: Option<String>,
    pub message: Option<String>,
}

impl OllamaClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .build()?;

        Ok(Self { endpoint, http })
    }

    pub fn from_config(config: &crate::config::OllamaConfig) -> Result<Self> {
        Self::new(
            config.endpoint.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Probe the server. Connection failures are reported, not returned as errors.
    pub async fn status(&self) -> OllamaStatus {
        let mut status = OllamaStatus {
            available: false,
            endpoint: self.endpoint.clone(),
            version: None,
            message: None,
        };

        let url = format!("{}/api/version", self.endpoint);
        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<VersionResponse>().await {
                    Ok(payload) => {
                        status.available = true;
                        status.version = Some(payload.version);
                    }
                    Err(e) => status.message = Some(format!("Unexpected version payload: {}", e)),
                }
            }
            Ok(response) => {
                let code = response.status();
                let body = response.text().await.unwrap_or_default();
                status.message = Some(format!("Ollama returned {}: {}", code, body.trim()));
            }
            Err(e) => status.message = Some(e.to_string()),
        }

        status
    }

    pub async fn embed(&self, model: &str, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.endpoint);
        let response = self
            .http
            .post(&url)
            .json(&EmbedRequest { model, input: inputs })
            .send()
            .await
            .map_err(|e| request_error(&url, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            return Err(anyhow!("Embedding request failed ({}): {}", status, body.trim()));
        }

        let payload: EmbedResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse embedding response from {}: {}", url, e))?;

        if payload.embeddings.len() != inputs.len() {
            return Err(anyhow!(
                "Ollama returned {} embeddings for {} inputs",
                payload.embeddings.len(),
                inputs.len()
            ));
        }

        Ok(payload.embeddings)
    }

    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String> {
        let url = format!("{}/api/generate", self.endpoint);
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: config.temperature,
                num_predict: config.max_tokens,
                stop: config.stop_sequences.clone(),
            },
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error(&url, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            return Err(anyhow!("Generate request failed ({}): {}", status, body.trim()));
        }

        let payload: GenerateResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse generate response from {}: {}", url, e))?;

        Ok(payload.response.trim().to_string())
    }
}

fn request_error(url: &str, e: reqwest::Error) -> anyhow::Error {
    if e.is_timeout() {
        anyhow!("Request to {} timed out", url)
    } else if e.is_connect() {
        anyhow!("Failed to connect to {} (is `ollama serve` running?): {}", url, e)
    } else {
        anyhow!("Request to {} failed: {}", url, e)
    }
}

/// An `LLMProvider` bound to one Ollama model.
pub struct OllamaProvider {
    client: OllamaClient,
    model: String,
}

impl OllamaProvider {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "Ollama generate");
        self.client.generate(&self.model, prompt, config).await
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "Ollama".to_string(),
            model: self.model.clone(),
            endpoint: self.client.endpoint().to_string(),
            is_local: true,
        }
    }

    async fn is_ready(&self) -> bool {
        self.client.status().await.available
    }
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    version: String,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

//! Supervisor: classifies a question with the LLM and dispatches it to the
//! matching domain responders.
//!
//! The classifier output is free text. Routing is a substring match of each
//! domain label (or "multiple") against the lowercased classification; when
//! nothing matches, every responder answers.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;

use super::responder::{DomainResponder, Responder};
use crate::config::AdvisorConfig;
use crate::llm::{GenerationConfig, LLMProvider, OllamaClient, OllamaProvider};
use crate::types::Domain;

pub const SUPERVISOR_MARKER: &str = "[🕵️‍♂️]";

/// Which responders a classification selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routing {
    pub domains: Vec<Domain>,
    /// True when the classification matched no category and all domains were selected.
    pub fallback: bool,
}

pub fn classification_prompt(question: &str) -> String {
    format!(
        r#"
    Classify the following user question into one of these categories:
    1. Demand Forecasting
    2. Inventory Monitoring
    3. Price Optimization
    4. Multiple Categories (if it involves more than one)

    User question: "{}"
    Output the category name only.
    "#,
        question
    )
}

/// Map a lowercased classification onto responders, in dispatch order.
pub fn route(category: &str) -> Routing {
    let multiple = category.contains("multiple");
    let domains: Vec<Domain> = Domain::ALL
        .into_iter()
        .filter(|d| multiple || category.contains(d.label()))
        .collect();

    if domains.is_empty() {
        Routing {
            domains: Domain::ALL.to_vec(),
            fallback: true,
        }
    } else {
        Routing {
            domains,
            fallback: false,
        }
    }
}

/// First character upper-cased, the rest lower-cased.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

pub struct Supervisor {
    llm: Arc<dyn LLMProvider>,
    responders: HashMap<Domain, Arc<dyn Responder>>,
    generation: GenerationConfig,
}

impl Supervisor {
    pub fn new(llm: Arc<dyn LLMProvider>, generation: GenerationConfig) -> Self {
        Self {
            llm,
            responders: HashMap::new(),
            generation,
        }
    }

    /// Build the supervisor model and all three responders from `config`.
    /// Responders are initialized in dispatch order; the first failure aborts.
    pub async fn from_config(config: &AdvisorConfig, rebuild: bool) -> Result<Self> {
        let client = OllamaClient::from_config(&config.ollama)?;
        let llm = Arc::new(OllamaProvider::new(client, config.models.supervisor.clone()));
        let mut supervisor = Self::new(llm, GenerationConfig::from(&config.generation));

        for domain in Domain::ALL {
            let responder = DomainResponder::from_config(domain, config, rebuild).await?;
            tracing::info!(
                domain = %domain,
                vectors = responder.vector_count(),
                model = %responder.model_name(),
                "Responder ready"
            );
            supervisor = supervisor.with_responder(Arc::new(responder));
        }

        Ok(supervisor)
    }

    pub fn with_responder(mut self, responder: Arc<dyn Responder>) -> Self {
        self.responders.insert(responder.domain(), responder);
        self
    }

    /// Ask the supervisor model for a category; returned trimmed and lowercased.
    pub async fn classify(&self, question: &str) -> Result<String> {
        let prompt = classification_prompt(question);
        let raw = self
            .llm
            .generate(&prompt, &self.generation)
            .await
            .context("Supervisor classification failed")?;
        Ok(raw.trim().to_lowercase())
    }

    /// Classify, dispatch, and concatenate the responders' sections.
    pub async fn execute_workflow(&self, question: &str) -> Result<String> {
        let category = self.classify(question).await?;
        let routing = route(&category);

        tracing::info!(
            category = %category,
            domains = ?routing.domains,
            fallback = routing.fallback,
            "Supervisor routing decision"
        );
        if routing.fallback {
            tracing::warn!("Category not specifically matched, using all agents as fallback");
        }

        let mut result = format!(
            "{} Supervisor classified query as: {}\n\n",
            SUPERVISOR_MARKER,
            capitalize(&category)
        );

        for domain in routing.domains {
            let responder = self
                .responders
                .get(&domain)
                .with_context(|| format!("No {} responder registered", domain))?;
            let response = responder.answer(question).await?;
            result.push_str(&response);
            result.push_str("\n\n");
        }

        Ok(result)
    }
}

use anyhow::Result;

use super::history::ChatSession;
use crate::rag::{format_response, Supervisor};

pub const EXAMPLE_QUESTIONS: [&str; 4] = [
    "What's the forecast demand for product id 5321 next month?",
    "Which products should be understocker to avoid high charges for inventory",
    "How should we adjust pricing for seasonal items?",
    "What's our optimal inventory strategy for high-demand products?",
];

pub const ABOUT_TEXT: &str = "\
This AI-powered system helps retail managers make data-driven decisions by providing insights on:
- 📊 Demand Forecasting
- 📦 Inventory Monitoring
- 💰 Price Optimization

How it works:
1. Type your question in the chat
2. A supervisor agent analyzes your query
3. Specialized agents provide domain-specific responses";

/// A chat session bound to a supervisor.
pub struct ChatEngine {
    supervisor: Supervisor,
    session: ChatSession,
}

impl ChatEngine {
    pub fn new(supervisor: Supervisor) -> Self {
        Self {
            supervisor,
            session: ChatSession::new(),
        }
    }

    /// Ask a question and return the formatted markdown answer.
    ///
    /// The question is recorded even when the workflow fails; the answer is
    /// recorded only on success.
    pub async fn ask(&mut self, question: &str) -> Result<String> {
        self.session.push_user(question);

        let raw = self.supervisor.execute_workflow(question).await?;
        let formatted = format_response(&raw);

        self.session.push_assistant(formatted.clone());
        Ok(formatted)
    }

    /// Ask the `n`th example question (1-based).
    pub async fn ask_example(&mut self, n: usize) -> Result<String> {
        let question = example_question(n)
            .ok_or_else(|| anyhow::anyhow!("No example question {} (1-{})", n, EXAMPLE_QUESTIONS.len()))?;
        self.ask(question).await
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }
}

pub fn example_question(n: usize) -> Option<&'static str> {
    n.checked_sub(1).and_then(|i| EXAMPLE_QUESTIONS.get(i)).copied()
}

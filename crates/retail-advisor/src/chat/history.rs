//! Session chat history: append-only, lives for the duration of the process.

use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    created_at: String,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn push(&mut self, role: MessageRole, content: impl Into<String>) {
        self.messages.push(ChatMessage {
            role,
            content: content.into(),
            timestamp: Utc::now().to_rfc3339(),
        });
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(MessageRole::User, content);
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(MessageRole::Assistant, content);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_keep_insertion_order() {
        let mut session = ChatSession::new();
        assert!(session.is_empty());

        session.push_user("What's the forecast demand for product id 5321 next month?");
        session.push_assistant("### 📊 Demand Forecasting\nAbout 140 units.");
        session.push_user("And pricing?");

        let roles: Vec<MessageRole> = session.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![MessageRole::User, MessageRole::Assistant, MessageRole::User]
        );
        assert_eq!(session.len(), 3);
        assert_eq!(session.messages()[2].content, "And pricing?");
        assert!(!session.messages()[0].timestamp.is_empty());
    }

    #[test]
    fn test_role_serializes_camel_case() {
        let json = serde_json::to_string(&MessageRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}

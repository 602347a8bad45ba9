pub mod engine;
pub mod history;

pub use engine::{ChatEngine, ABOUT_TEXT, EXAMPLE_QUESTIONS};
pub use history::{ChatMessage, ChatSession, MessageRole};

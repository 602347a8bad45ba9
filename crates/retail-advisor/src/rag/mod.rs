//! Retrieval-augmented answering: domain responders, the supervisor that
//! routes between them, and display formatting of the combined response.

pub mod format;
pub mod responder;
pub mod supervisor;

pub use format::format_response;
pub use responder::{build_index, with_response_header, DomainResponder, Responder};
pub use supervisor::{classification_prompt, route, Routing, Supervisor, SUPERVISOR_MARKER};

//! Chat orchestration: classify a message, resolve its location, fetch
//! the weather it asks for, generate a reply, and polish the result.

pub mod context;
pub mod intent;
pub mod pipeline;
pub mod sanitize;
pub mod types;

pub use context::{assemble, LocationSource, OrchestrationContext};
pub use intent::{classify, Intent};
pub use pipeline::Pipeline;
pub use sanitize::{ClosingChooser, Sanitizer, SymbolTable};
pub use types::{ChatOutcome, ChatReply, ChatRequest};

pub use nimbus_llm::ChatMessage;

//! Reply generation: prompt assembly and an ordered model fallback chain
//! over an OpenAI-compatible chat completions API.

pub mod backend;
pub mod chain;
pub mod client;
pub mod error;
pub mod prompt;
pub mod types;

pub use backend::GenerationBackend;
pub use chain::{FallbackChain, DEFAULT_MODELS, FALLBACK_REPLY};
pub use client::ChatCompletionsClient;
pub use error::{ChainError, GenerationError};
pub use prompt::{build_messages, system_prompt, PromptInputs, HISTORY_TURNS};
pub use types::{ChatMessage, FailedAttempt, Generation, GenerationRequest, Role, Usage};

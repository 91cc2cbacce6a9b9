use std::sync::Arc;

use tracing::instrument;

use crate::backend::GenerationBackend;
use crate::error::ChainError;
use crate::types::{ChatMessage, FailedAttempt, Generation, GenerationRequest};

/// Models tried in order of preference.
pub const DEFAULT_MODELS: [&str; 3] = ["gpt-3.5-turbo-0125", "gpt-3.5-turbo", "gpt-4o-mini"];

/// Terminal reply when every model in the chain has failed.
pub const FALLBACK_REPLY: &str =
    "I'm having trouble connecting to the AI service right now! 😅 Please try again in a moment.";

const DEFAULT_MAX_TOKENS: u32 = 1000;
const DEFAULT_TEMPERATURE: f32 = 0.8;

/// Tries a fixed model list in order and returns the first success.
///
/// Every attempt builds its request from scratch, so a failed model
/// leaves nothing behind for the next one.
pub struct FallbackChain {
    backend: Arc<dyn GenerationBackend>,
    models: Vec<String>,
    max_tokens: u32,
    temperature: f32,
}

impl FallbackChain {
    pub fn new(backend: Arc<dyn GenerationBackend>, models: Vec<String>) -> Self {
        Self {
            backend,
            models,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    /// Runs the chain over one prepared transcript.
    ///
    /// # Errors
    ///
    /// `ChainError::Exhausted` with a per-model failure record when no
    /// model produced a completion.
    #[instrument(skip(self, messages), level = "info")]
    pub async fn generate(&self, messages: &[ChatMessage]) -> Result<Generation, ChainError> {
        let mut attempts: Vec<FailedAttempt> = Vec::new();

        for model in &self.models {
            let request = GenerationRequest {
                model: model.clone(),
                messages: messages.to_vec(),
                max_tokens: self.max_tokens,
                temperature: self.temperature,
            };

            tracing::info!(model = %model, "trying model");
            match self.backend.complete(&request).await {
                Ok(generation) => {
                    tracing::info!(model = %generation.model, "model answered");
                    return Ok(generation);
                }
                Err(e) => {
                    tracing::warn!(model = %model, error = %e, "model attempt failed");
                    attempts.push(FailedAttempt {
                        model: model.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::error!(attempts = attempts.len(), "all models failed");
        Err(ChainError::Exhausted { attempts })
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }
}

impl std::fmt::Debug for FallbackChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackChain")
            .field("models", &self.models)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

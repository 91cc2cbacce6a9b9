use async_trait::async_trait;

use crate::error::GenerationError;
use crate::types::{Generation, GenerationRequest};

/// Seam between the fallback chain and whatever serves completions.
///
/// Production uses [`crate::ChatCompletionsClient`]; tests swap in
/// scripted implementations.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn complete(&self, request: &GenerationRequest) -> Result<Generation, GenerationError>;
}

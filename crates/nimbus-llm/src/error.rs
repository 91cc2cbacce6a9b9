use thiserror::Error;

use crate::types::FailedAttempt;

/// Errors from a single completion attempt.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("model {0} not available")]
    ModelNotFound(String),

    #[error("completion came back empty")]
    EmptyCompletion,

    #[error("Request timed out")]
    Timeout,

    #[error("API error: {0}")]
    Api(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl GenerationError {
    /// Whether the next model in a chain is worth trying.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidApiKey)
    }
}

/// The whole fallback chain failed.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("all generation models failed")]
    Exhausted { attempts: Vec<FailedAttempt> },
}

impl ChainError {
    pub fn attempts(&self) -> &[FailedAttempt] {
        match self {
            Self::Exhausted { attempts } => attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_bad_credentials_are_terminal() {
        assert!(!GenerationError::InvalidApiKey.is_retryable());
        assert!(GenerationError::RateLimited.is_retryable());
        assert!(GenerationError::EmptyCompletion.is_retryable());
        assert!(GenerationError::ModelNotFound("gpt-x".to_string()).is_retryable());
    }

    #[test]
    fn test_exhausted_exposes_attempts() {
        let err = ChainError::Exhausted {
            attempts: vec![FailedAttempt {
                model: "gpt-3.5-turbo".to_string(),
                reason: "HTTP 500".to_string(),
            }],
        };
        assert_eq!(err.attempts().len(), 1);
        assert_eq!(err.to_string(), "all generation models failed");
    }
}

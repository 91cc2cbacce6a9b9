use thiserror::Error;

/// Errors from location extraction and resolution.
#[derive(Debug, Error)]
pub enum GeoError {
    /// The search ran but produced no usable candidates.
    #[error("no locations found for \"{query}\"")]
    NotFound { query: String },

    /// Every search attempt failed upstream.
    #[error("location search failed for \"{query}\": {reason}")]
    Unavailable { query: String, reason: String },

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Request timed out")]
    Timeout,

    #[error("API error: {0}")]
    Api(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl GeoError {
    /// Conversational message shown to the user in place of a reply.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { query } => format!(
                "I couldn't find a location called \"{query}\". Could you try a different city name or be more specific? For example: \"New York, NY\" or \"London, UK\"."
            ),
            Self::Unavailable { query, .. } => format!(
                "I had trouble searching for \"{query}\". Please try again or check the spelling. You can also try being more specific, like \"Paris, France\" instead of just \"Paris\"."
            ),
            Self::InvalidApiKey => {
                "Invalid API key. Please check the geocoding configuration.".to_string()
            }
            Self::RateLimited => "Too many location searches. Please try again later.".to_string(),
            Self::Timeout => "Location search timed out - please try again.".to_string(),
            Self::Network(_) => {
                "Network error: Unable to reach the location service.".to_string()
            }
            Self::Api(msg) => format!("Location service error: {msg}"),
            Self::Parse(_) => {
                "Received an invalid response from the location service.".to_string()
            }
        }
    }

    /// Short marker carried in the orchestration context's error slot.
    pub fn marker(&self) -> String {
        match self {
            Self::NotFound { query } => format!("Location \"{query}\" not found"),
            Self::Unavailable { .. } => "Location search failed".to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable { .. }
                | Self::RateLimited
                | Self::Timeout
                | Self::Api(_)
                | Self::Network(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_suggests_alternatives() {
        let err = GeoError::NotFound {
            query: "atlantis".to_string(),
        };
        let msg = err.user_message();
        assert!(msg.contains("\"atlantis\""));
        assert!(msg.contains("New York, NY"));
        assert_eq!(err.marker(), "Location \"atlantis\" not found");
    }

    #[test]
    fn test_unavailable_message_suggests_retry() {
        let err = GeoError::Unavailable {
            query: "paris".to_string(),
            reason: "HTTP 500".to_string(),
        };
        assert!(err.user_message().contains("trouble searching for \"paris\""));
        assert_eq!(err.marker(), "Location search failed");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_not_found_is_terminal() {
        let err = GeoError::NotFound {
            query: "x".to_string(),
        };
        assert!(!err.is_retryable());
    }
}

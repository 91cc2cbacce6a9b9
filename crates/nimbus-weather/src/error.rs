use thiserror::Error;

/// Errors returned by the weather and alert clients.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Location not found")]
    LocationNotFound,

    #[error("Invalid coordinates: lat={lat}, lon={lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },

    #[error("Request timed out")]
    Timeout,

    #[error("API error: {0}")]
    Api(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl WeatherError {
    /// User-friendly message suitable for chat output.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidApiKey => {
                "Invalid API key. Please check the weather service configuration.".to_string()
            }
            Self::RateLimited => {
                "API rate limit exceeded. Please try again later.".to_string()
            }
            Self::LocationNotFound => {
                "Location not found. Please check the coordinates.".to_string()
            }
            Self::InvalidCoordinates { .. } => {
                "Invalid coordinates provided.".to_string()
            }
            Self::Timeout => {
                "Weather service request timed out - please try again.".to_string()
            }
            Self::Network(_) => {
                "Network error: Unable to reach weather service. Please check your internet connection.".to_string()
            }
            Self::Api(msg) => format!("Weather service error: {msg}"),
            Self::Parse(_) => "Received an invalid response from the weather service.".to_string(),
        }
    }

    /// Whether a retry could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout | Self::RateLimited => true,
            Self::Api(_) => true,
            Self::InvalidApiKey
            | Self::LocationNotFound
            | Self::InvalidCoordinates { .. }
            | Self::Parse(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert!(WeatherError::InvalidApiKey.user_message().contains("API key"));
        assert!(WeatherError::RateLimited.user_message().contains("rate limit"));
        assert!(WeatherError::Timeout.user_message().contains("timed out"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(WeatherError::Timeout.is_retryable());
        assert!(WeatherError::RateLimited.is_retryable());
        assert!(!WeatherError::InvalidApiKey.is_retryable());
        assert!(!WeatherError::InvalidCoordinates { lat: 999.0, lon: 0.0 }.is_retryable());
    }
}

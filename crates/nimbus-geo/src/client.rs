use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::instrument;

use crate::error::GeoError;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// One row of a direct-geocoding response.
#[derive(Debug, Clone, Deserialize)]
pub struct GeoPlace {
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

/// Client for the OpenWeather direct geocoding endpoint.
#[derive(Debug, Clone)]
pub struct GeocodeClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeocodeClient {
    pub fn new(api_key: String) -> Self {
        Self::new_with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn new_with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }

    /// Runs one geocoding query and returns the raw candidate rows.
    #[instrument(skip(self), level = "debug")]
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<GeoPlace>, GeoError> {
        let url = format!("{}/geo/1.0/direct", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .query(&[
                ("q", query),
                ("limit", &limit.to_string()),
                ("appid", &self.api_key),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeoError::Timeout
                } else {
                    GeoError::Network(e)
                }
            })?;

        let status = response.status();
        match status {
            StatusCode::OK => response
                .json()
                .await
                .map_err(|e| GeoError::Parse(e.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(GeoError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => Err(GeoError::RateLimited),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(GeoError::Api(format!("HTTP {status}: {body}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_search_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .and(query_param("q", "paris"))
            .and(query_param("limit", "10"))
            .and(query_param("appid", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "Paris", "country": "FR", "lat": 48.8566, "lon": 2.3522},
                {"name": "Paris", "state": "Texas", "country": "US", "lat": 33.6609, "lon": -95.5555}
            ])))
            .mount(&mock_server)
            .await;

        let client = GeocodeClient::new_with_base_url("test-key".to_string(), mock_server.uri());
        let places = client.search("paris", 10).await.unwrap();

        assert_eq!(places.len(), 2);
        assert_eq!(places[0].name, "Paris");
        assert_eq!(places[0].country, "FR");
        assert_eq!(places[1].state.as_deref(), Some("Texas"));
    }

    #[tokio::test]
    async fn test_search_empty_result() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&mock_server)
            .await;

        let client = GeocodeClient::new_with_base_url("test-key".to_string(), mock_server.uri());
        let places = client.search("atlantis", 10).await.unwrap();

        assert!(places.is_empty());
    }

    #[tokio::test]
    async fn test_search_invalid_api_key() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let client = GeocodeClient::new_with_base_url("bad-key".to_string(), mock_server.uri());
        let result = client.search("paris", 10).await;

        assert!(matches!(result, Err(GeoError::InvalidApiKey)));
    }
}

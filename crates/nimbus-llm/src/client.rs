use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::backend::GenerationBackend;
use crate::error::GenerationError;
use crate::types::{ChatMessage, Generation, GenerationRequest, Usage};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ChatCompletionsClient {
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
}

#[async_trait]
impl GenerationBackend for ChatCompletionsClient {
    #[instrument(skip(self, request), fields(model = %request.model), level = "info")]
    async fn complete(&self, request: &GenerationRequest) -> Result<Generation, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = WireRequest {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout
                } else {
                    GenerationError::Network(e)
                }
            })?;

        let status = response.status();
        match status {
            StatusCode::OK => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(GenerationError::InvalidApiKey)
            }
            StatusCode::NOT_FOUND => {
                return Err(GenerationError::ModelNotFound(request.model.clone()))
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(GenerationError::RateLimited),
            _ => {
                let body = response.text().await.unwrap_or_default();
                return Err(GenerationError::Api(format!("HTTP {status}: {body}")));
            }
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Parse(e.to_string()))?;

        let text = wire
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyCompletion);
        }

        Ok(Generation {
            text,
            model: wire.model.unwrap_or_else(|| request.model.clone()),
            usage: wire.usage,
        })
    }
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<Usage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> GenerationRequest {
        GenerationRequest {
            model: "gpt-3.5-turbo-0125".to_string(),
            messages: vec![
                ChatMessage::system("You are helpful."),
                ChatMessage::user("hello"),
            ],
            max_tokens: 1000,
            temperature: 0.8,
        }
    }

    #[tokio::test]
    async fn test_complete_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-3.5-turbo-0125",
                "max_tokens": 1000
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gpt-3.5-turbo-0125",
                "choices": [{"message": {"role": "assistant", "content": "Hi there! ☀️"}}],
                "usage": {"prompt_tokens": 20, "completion_tokens": 5, "total_tokens": 25}
            })))
            .mount(&mock_server)
            .await;

        let client =
            ChatCompletionsClient::new_with_base_url("test-key".to_string(), mock_server.uri());
        let generation = client.complete(&request()).await.unwrap();

        assert_eq!(generation.text, "Hi there! ☀️");
        assert_eq!(generation.model, "gpt-3.5-turbo-0125");
        assert_eq!(generation.usage.map(|u| u.total_tokens), Some(25));
    }

    #[tokio::test]
    async fn test_complete_model_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"message": "The model does not exist"}
            })))
            .mount(&mock_server)
            .await;

        let client =
            ChatCompletionsClient::new_with_base_url("test-key".to_string(), mock_server.uri());
        let result = client.complete(&request()).await;

        match result {
            Err(GenerationError::ModelNotFound(model)) => {
                assert_eq!(model, "gpt-3.5-turbo-0125");
            }
            other => panic!("expected ModelNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_empty_choice_is_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": ""}}]
            })))
            .mount(&mock_server)
            .await;

        let client =
            ChatCompletionsClient::new_with_base_url("test-key".to_string(), mock_server.uri());
        let result = client.complete(&request()).await;

        assert!(matches!(result, Err(GenerationError::EmptyCompletion)));
    }

    #[tokio::test]
    async fn test_complete_invalid_key() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let client =
            ChatCompletionsClient::new_with_base_url("bad-key".to_string(), mock_server.uri());
        let result = client.complete(&request()).await;

        assert!(matches!(result, Err(GenerationError::InvalidApiKey)));
    }
}

//! OpenAI chat completions client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ChatError, Result};
use crate::llm::types::Message;
use crate::llm::LlmClient;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// OpenAI chat completions endpoint.
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Maximum number of attempts for transient errors.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
const RETRY_BASE_DELAY_MS: u64 = 1000;

/// OpenAI client configuration.
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// Endpoint URL. Overridable for OpenAI-compatible gateways.
    pub api_url: String,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.0,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            api_url: OPENAI_API_URL.to_string(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

/// OpenAI LLM client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::llm(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn build_request(&self, messages: &[Message], stop: &[&str]) -> OpenAiRequest {
        OpenAiRequest {
            model: self.config.model.clone(),
            messages: messages
                .iter()
                .map(|m| OpenAiMessage {
                    role: m.role.as_str().to_string(),
                    content: Some(m.content.clone()),
                })
                .collect(),
            temperature: self.config.temperature,
            stop: (!stop.is_empty()).then(|| stop.iter().map(|s| s.to_string()).collect()),
            stream: false,
        }
    }

    /// Parses an API error response and returns (error, is_retryable).
    fn parse_error(status: StatusCode, body: &str) -> (ChatError, bool) {
        if status == StatusCode::UNAUTHORIZED {
            return (
                ChatError::llm("Authentication failed. Check your OPENAI_API_KEY."),
                false,
            );
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return (ChatError::llm("Rate limited. Please wait and try again."), true);
        }

        let is_retryable = status.is_server_error();

        match serde_json::from_str::<OpenAiErrorResponse>(body) {
            Ok(error_response) => (
                ChatError::llm(format!("OpenAI API error: {}", error_response.error.message)),
                is_retryable,
            ),
            Err(_) => (
                ChatError::llm(format!("OpenAI API error ({status}): {body}")),
                is_retryable,
            ),
        }
    }

    /// Sends one request. The flag on error says whether to retry.
    async fn send_once(
        &self,
        request: &OpenAiRequest,
    ) -> std::result::Result<String, (ChatError, bool)> {
        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                let retryable = e.is_timeout() || e.is_connect();
                let error = if e.is_timeout() {
                    ChatError::llm("Request timed out. Try again.")
                } else if e.is_connect() {
                    ChatError::llm("Failed to connect to OpenAI API. Check your network.")
                } else {
                    ChatError::llm(format!("Request failed: {e}"))
                };
                (error, retryable)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| (ChatError::llm(format!("Failed to read response: {e}")), false))?;

        if !status.is_success() {
            return Err(Self::parse_error(status, &body));
        }

        let parsed: OpenAiResponse = serde_json::from_str(&body)
            .map_err(|e| (ChatError::llm(format!("Failed to parse response: {e}")), false))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| (ChatError::llm("No response from OpenAI"), false))
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        self.complete_with_stop(messages, &[]).await
    }

    async fn complete_with_stop(&self, messages: &[Message], stop: &[&str]) -> Result<String> {
        let request = self.build_request(messages, stop);
        let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);
        let mut attempt = 1;

        loop {
            debug!("OpenAI API request attempt {} of {}", attempt, MAX_RETRY_ATTEMPTS);

            match self.send_once(&request).await {
                Ok(content) => return Ok(content),
                Err((error, true)) if attempt < MAX_RETRY_ATTEMPTS => {
                    warn!(
                        "OpenAI API request failed (attempt {}), retrying in {:?}: {}",
                        attempt, delay, error
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err((error, _)) => return Err(error),
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn client() -> OpenAiClient {
        OpenAiClient::new(OpenAiConfig::new("sk-test", "gpt-3.5-turbo")).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = OpenAiConfig::new("sk-test", "gpt-4o").with_timeout(60);
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.api_url, OPENAI_API_URL);
    }

    #[test]
    fn test_config_debug_hides_key() {
        let debug = format!("{:?}", OpenAiConfig::new("sk-secret", "gpt-4o"));
        assert!(!debug.contains("sk-secret"));
    }

    #[test]
    fn test_request_body_with_stop() {
        let messages = vec![Message::system("prefix"), Message::user("How many users?")];
        let request = client().build_request(&messages, &["\nObservation:"]);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    {"role": "system", "content": "prefix"},
                    {"role": "user", "content": "How many users?"}
                ],
                "temperature": 0.0,
                "stop": ["\nObservation:"],
                "stream": false
            })
        );
    }

    #[test]
    fn test_request_body_without_stop() {
        let request = client().build_request(&[Message::user("hi")], &[]);
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("stop").is_none());
    }

    #[test]
    fn test_response_with_null_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let parsed: OpenAiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, None);
    }

    #[test]
    fn test_parse_error_unauthorized() {
        let (error, is_retryable) = OpenAiClient::parse_error(StatusCode::UNAUTHORIZED, "");
        assert!(error.to_string().contains("Authentication failed"));
        assert!(!is_retryable);
    }

    #[test]
    fn test_parse_error_rate_limited() {
        let (error, is_retryable) = OpenAiClient::parse_error(StatusCode::TOO_MANY_REQUESTS, "");
        assert!(error.to_string().contains("Rate limited"));
        assert!(is_retryable);
    }

    #[test]
    fn test_parse_error_with_message() {
        let body = r#"{"error":{"message":"Invalid API key"}}"#;
        let (error, is_retryable) = OpenAiClient::parse_error(StatusCode::BAD_REQUEST, body);
        assert!(error.to_string().contains("Invalid API key"));
        assert!(!is_retryable);
    }

    #[test]
    fn test_parse_error_server_error_is_retryable() {
        let (_, is_retryable) = OpenAiClient::parse_error(StatusCode::BAD_GATEWAY, "oops");
        assert!(is_retryable);
    }
}

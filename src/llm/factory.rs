//! LLM client factory.

use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::{ChatError, Result};
use crate::llm::{LlmClient, LlmProvider, MockLlmClient, OpenAiClient, OpenAiConfig};

/// Message shown when the OpenAI key is absent.
const MISSING_KEY_MESSAGE: &str =
    "OpenAI API key is not set. Export OPENAI_API_KEY or add it to a .env file.";

/// Creates an LLM client for the given provider.
///
/// For OpenAI the key comes from `api_key`, falling back to `OPENAI_API_KEY`.
/// A missing or empty key is a `MissingCredential` error. `OPENAI_MODEL`
/// overrides the configured model and `OPENAI_BASE_URL` the endpoint.
pub fn create_client(
    provider: LlmProvider,
    settings: &LlmConfig,
    api_key: Option<String>,
) -> Result<Arc<dyn LlmClient>> {
    match provider {
        LlmProvider::OpenAi => {
            let key = api_key
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| ChatError::missing_credential(MISSING_KEY_MESSAGE))?;

            let model = std::env::var("OPENAI_MODEL")
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| settings.model.clone());

            let mut config = OpenAiConfig::new(key, model)
                .with_temperature(settings.temperature)
                .with_timeout(settings.timeout_secs);
            if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
                config = config.with_api_url(format!(
                    "{}/chat/completions",
                    url.trim_end_matches('/')
                ));
            }

            Ok(Arc::new(OpenAiClient::new(config)?))
        }
        LlmProvider::Mock => Ok(Arc::new(MockLlmClient::new())),
    }
}

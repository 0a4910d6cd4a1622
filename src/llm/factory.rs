//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating LLM clients.

use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::llm::{LlmClient, LlmProvider, LlmSettings, MockLlmClient, OpenAiClient, OpenAiConfig};

/// Creates an LLM client for the resolved settings.
///
/// A missing API key is not an error here: the client is still built and
/// every request it makes fails with a message naming the variable to set.
pub fn create_client(settings: &LlmSettings) -> Result<Arc<dyn LlmClient>> {
    debug!(
        provider = %settings.provider,
        model = %settings.model,
        has_key = settings.api_key.is_some(),
        "Creating LLM client"
    );

    match settings.provider {
        LlmProvider::Groq | LlmProvider::OpenAi => Ok(Arc::new(OpenAiClient::new(
            OpenAiConfig::from_settings(settings),
        )?)),
        LlmProvider::Mock => Ok(Arc::new(MockLlmClient::new())),
    }
}

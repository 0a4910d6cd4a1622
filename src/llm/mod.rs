//! LLM integration for sqlchat.
//!
//! Provides the client trait the SQL agent talks to, the provider selection
//! and an OpenAI-compatible HTTP client used for both Groq and OpenAI.

pub mod factory;
pub mod mock;
pub mod openai;
pub mod tools;
pub mod types;

pub use factory::create_client;
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, OpenAiConfig};
pub use tools::ToolDefinition;
pub use types::{LlmResponse, Message, Role, ToolCall};

use async_trait::async_trait;
use std::str::FromStr;

use crate::config::LlmConfig;
use crate::error::{ChatError, Result};

/// Environment variable that overrides the configured model.
pub const MODEL_ENV_VAR: &str = "SQLCHAT_MODEL";

/// Trait for LLM clients that can generate completions.
///
/// Implementations must be thread-safe (Send + Sync) to support async operations.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates a plain completion for the given messages.
    async fn complete(&self, messages: &[Message]) -> Result<String>;

    /// Generates a completion that may request calls to the given tools.
    async fn complete_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse>;
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// Groq's hosted inference (OpenAI-compatible API).
    #[default]
    Groq,
    /// OpenAI.
    OpenAi,
    /// Scripted client for tests and offline runs (no API key required).
    Mock,
}

impl LlmProvider {
    /// Returns the provider as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }

    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Groq => "llama-3.1-8b-instant",
            Self::OpenAi => "gpt-4o-mini",
            Self::Mock => "mock",
        }
    }

    /// Chat completions endpoint used when no base URL is configured.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::Groq => "https://api.groq.com/openai/v1/chat/completions",
            Self::OpenAi => "https://api.openai.com/v1/chat/completions",
            Self::Mock => "",
        }
    }

    /// Environment variable holding the API key, if the provider needs one.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::Groq => Some("GROQ_API_KEY"),
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Mock => None,
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "openai" => Ok(Self::OpenAi),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolved settings for building an LLM client.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub model: String,
    pub temperature: f32,
    pub endpoint: String,
    pub timeout_secs: Option<u64>,
    /// API key read once at startup. `None` is allowed; requests then fail.
    pub api_key: Option<String>,
}

impl LlmSettings {
    /// Resolves settings from the config file section and the environment.
    ///
    /// The model comes from `SQLCHAT_MODEL`, then the config, then the
    /// provider default. The API key is read from the provider's variable.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let provider: LlmProvider = config.provider.parse().map_err(ChatError::config)?;

        let model = std::env::var(MODEL_ENV_VAR)
            .ok()
            .filter(|m| !m.trim().is_empty())
            .or_else(|| config.model.clone())
            .unwrap_or_else(|| provider.default_model().to_string());

        let api_key = provider
            .api_key_env()
            .and_then(|var| std::env::var(var).ok())
            .filter(|k| !k.trim().is_empty());

        Ok(Self {
            provider,
            model,
            temperature: config.temperature,
            endpoint: config
                .base_url
                .clone()
                .unwrap_or_else(|| provider.default_endpoint().to_string()),
            timeout_secs: config.timeout_secs,
            api_key,
        })
    }

    /// Settings for the mock provider.
    pub fn mock() -> Self {
        Self {
            provider: LlmProvider::Mock,
            model: LlmProvider::Mock.default_model().to_string(),
            temperature: 0.0,
            endpoint: String::new(),
            timeout_secs: None,
            api_key: None,
        }
    }
}

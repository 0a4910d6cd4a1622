//! OpenAI-compatible LLM client implementation.
//!
//! Implements the LlmClient trait for chat completions endpoints that speak
//! the OpenAI wire format with tool calling (Groq, OpenAI, local servers).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::{ChatError, Result};
use crate::llm::tools::ToolDefinition;
use crate::llm::types::{LlmResponse, Message, ToolCall};
use crate::llm::{LlmClient, LlmProvider, LlmSettings};

/// OpenAI-compatible client configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key for authentication. Requests fail without one.
    pub api_key: Option<String>,
    /// Model to use (e.g., "llama-3.1-8b-instant").
    pub model: String,
    /// Full URL of the chat completions endpoint.
    pub endpoint: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request timeout in seconds; `None` keeps the HTTP client default.
    pub timeout_secs: Option<u64>,
    /// Name used in error messages.
    pub provider_name: String,
    /// Variable the key is expected in, for error messages.
    pub api_key_env: String,
}

impl OpenAiConfig {
    /// Creates a config for Groq with the given API key and model.
    pub fn groq(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            api_key,
            model: model.into(),
            endpoint: LlmProvider::Groq.default_endpoint().to_string(),
            temperature: 0.0,
            timeout_secs: None,
            provider_name: "Groq".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
        }
    }

    /// Builds the config from resolved settings.
    pub fn from_settings(settings: &LlmSettings) -> Self {
        let provider_name = match settings.provider {
            LlmProvider::OpenAi => "OpenAI",
            _ => "Groq",
        };
        Self {
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            endpoint: settings.endpoint.clone(),
            temperature: settings.temperature,
            timeout_secs: settings.timeout_secs,
            provider_name: provider_name.to_string(),
            api_key_env: settings
                .provider
                .api_key_env()
                .unwrap_or("GROQ_API_KEY")
                .to_string(),
        }
    }
}

/// OpenAI-compatible LLM client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ChatError::llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Converts internal messages to the wire format.
    fn convert_messages(messages: &[Message]) -> Vec<WireMessage> {
        messages
            .iter()
            .map(|m| WireMessage {
                role: m.role.as_str().to_string(),
                content: Some(m.content.clone()),
                tool_calls: (!m.tool_calls.is_empty()).then(|| {
                    m.tool_calls
                        .iter()
                        .map(|call| WireToolCall {
                            id: call.id.clone(),
                            call_type: "function".to_string(),
                            function: WireFunctionCall {
                                name: call.name.clone(),
                                arguments: call.arguments.clone(),
                            },
                        })
                        .collect()
                }),
                tool_call_id: m.tool_call_id.clone(),
            })
            .collect()
    }

    fn convert_tools(tools: &[ToolDefinition]) -> Vec<WireTool> {
        tools
            .iter()
            .map(|t| WireTool {
                tool_type: "function".to_string(),
                function: WireFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }

    /// Parses an API error response into a user-facing error.
    fn parse_error(&self, status: reqwest::StatusCode, body: &str) -> ChatError {
        let provider = &self.config.provider_name;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return ChatError::llm(format!(
                "Authentication failed. Check your {}.",
                self.config.api_key_env
            ));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return ChatError::llm("Rate limited. Please wait and try again.");
        }

        if let Ok(error_response) = serde_json::from_str::<WireErrorResponse>(body) {
            return ChatError::llm(format!(
                "{provider} API error: {}",
                error_response.error.message
            ));
        }

        ChatError::llm(format!("{provider} API error ({}): {}", status, body))
    }

    fn request_error(&self, error: reqwest::Error) -> ChatError {
        if error.is_timeout() {
            ChatError::llm("Request timed out. Try again.")
        } else if error.is_connect() {
            ChatError::llm(format!(
                "Failed to connect to {} API. Check your network.",
                self.config.provider_name
            ))
        } else {
            ChatError::llm(format!("Request failed: {}", error))
        }
    }

    /// Sends one chat completion request. Never retried.
    async fn send(&self, request: &ChatRequest) -> Result<WireChoiceMessage> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            ChatError::llm(format!(
                "No API key configured. Set {}.",
                self.config.api_key_env
            ))
        })?;

        let start = Instant::now();
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChatError::llm(format!("Failed to read response: {}", e)))?;

        debug!(
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            model = %self.config.model,
            "Chat completion returned"
        );

        if !status.is_success() {
            return Err(self.parse_error(status, &body));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ChatError::llm(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| {
                ChatError::llm(format!("No response from {}", self.config.provider_name))
            })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: Self::convert_messages(messages),
            temperature: self.config.temperature,
            tools: None,
        };

        let message = self.send(&request).await?;
        Ok(message.content.unwrap_or_default())
    }

    async fn complete_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: Self::convert_messages(messages),
            temperature: self.config.temperature,
            tools: (!tools.is_empty()).then(|| Self::convert_tools(tools)),
        };

        let message = self.send(&request).await?;
        let tool_calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        Ok(LlmResponse::with_tool_calls(
            message.content.unwrap_or_default(),
            tool_calls,
        ))
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: WireFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct WireChoiceMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireErrorResponse {
    error: WireError,
}

#[derive(Debug, Deserialize)]
struct WireError {
    message: String,
}

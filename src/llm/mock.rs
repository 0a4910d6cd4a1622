//! Mock LLM client for testing.
//!
//! Replays scripted responses in order. Once the script runs out it falls
//! back to a small deterministic agent: list the tables, then answer with
//! what it saw.

use async_trait::async_trait;
use regex::Regex;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::{ChatError, Result};
use crate::llm::tools::ToolDefinition;
use crate::llm::types::{LlmResponse, Message, Role};
use crate::llm::LlmClient;

/// Mock LLM client that returns canned responses.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    script: Arc<Mutex<VecDeque<Result<LlmResponse>>>>,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
    failure: Option<String>,
}

impl MockLlmClient {
    /// Creates a new mock client with default behaviour.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client whose every call fails with an LLM error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Queues a response for the next call.
    pub fn with_response(self, response: LlmResponse) -> Self {
        self.push(Ok(response));
        self
    }

    /// Queues an error for the next call.
    pub fn with_error(self, error: ChatError) -> Self {
        self.push(Err(error));
        self
    }

    fn push(&self, item: Result<LlmResponse>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(item);
        }
    }

    /// Every message list this client has been called with, in order.
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn record(&self, messages: &[Message]) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(messages.to_vec());
        }
    }

    fn next_scripted(&self) -> Option<Result<LlmResponse>> {
        self.script.lock().ok().and_then(|mut s| s.pop_front())
    }

    /// Unscripted tool-calling behaviour.
    fn default_response(messages: &[Message], tools: &[ToolDefinition]) -> LlmResponse {
        let last = messages.last();

        if let Some(result) = last.filter(|m| m.role == Role::Tool) {
            return LlmResponse::text(format!(
                "The database contains the following tables: {}",
                result.content
            ));
        }

        if tools.iter().any(|t| t.name == "sql_db_list_tables") {
            return LlmResponse::tool_call("mock_call_1", "sql_db_list_tables", serde_json::json!({}));
        }

        LlmResponse::text("I don't understand that question. Could you please rephrase it?")
    }

    /// Unscripted plain completion: echo the first fenced block of the
    /// last user message, or the message itself.
    fn default_completion(messages: &[Message]) -> String {
        let input = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        Regex::new(r"(?s)```(?:[a-zA-Z]+)?\s*\n(.*?)\n?```")
            .ok()
            .and_then(|re| re.captures(input))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_else(|| input.to_string())
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        self.record(messages);
        if let Some(message) = &self.failure {
            return Err(ChatError::llm(message.clone()));
        }
        match self.next_scripted() {
            Some(item) => item.map(|r| r.content),
            None => Ok(Self::default_completion(messages)),
        }
    }

    async fn complete_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse> {
        self.record(messages);
        if let Some(message) = &self.failure {
            return Err(ChatError::llm(message.clone()));
        }
        match self.next_scripted() {
            Some(item) => item,
            None => Ok(Self::default_response(messages, tools)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_tables_tool() -> Vec<ToolDefinition> {
        vec![ToolDefinition::no_args("sql_db_list_tables", "List tables")]
    }

    #[tokio::test]
    async fn test_scripted_responses_in_order() {
        let client = MockLlmClient::new()
            .with_response(LlmResponse::text("first"))
            .with_response(LlmResponse::text("second"));

        let messages = vec![Message::user("hi")];
        let a = client.complete_with_tools(&messages, &[]).await.unwrap();
        let b = client.complete_with_tools(&messages, &[]).await.unwrap();

        assert_eq!(a.content, "first");
        assert_eq!(b.content, "second");
        assert_eq!(client.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_default_lists_tables_then_answers() {
        let client = MockLlmClient::new();
        let tools = list_tables_tool();

        let mut messages = vec![Message::user("What tables are there?")];
        let first = client.complete_with_tools(&messages, &tools).await.unwrap();
        assert_eq!(first.tool_calls[0].name, "sql_db_list_tables");

        messages.push(Message::assistant_tool_calls("", first.tool_calls.clone()));
        messages.push(Message::tool_result("mock_call_1", "customers, orders"));
        let second = client.complete_with_tools(&messages, &tools).await.unwrap();

        assert!(!second.has_tool_calls());
        assert_eq!(
            second.content,
            "The database contains the following tables: customers, orders"
        );
    }

    #[tokio::test]
    async fn test_default_completion_echoes_fenced_block() {
        let client = MockLlmClient::new();
        let messages = vec![Message::user("Check this:\n```sql\nSELECT 1\n```\nThanks")];
        assert_eq!(client.complete(&messages).await.unwrap(), "SELECT 1");
    }

    #[tokio::test]
    async fn test_failing_client() {
        let client = MockLlmClient::failing("Rate limited. Please wait and try again.");
        let err = client
            .complete_with_tools(&[Message::user("hi")], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Llm(_)));
    }

    #[tokio::test]
    async fn test_clones_share_script_and_requests() {
        let client = MockLlmClient::new().with_response(LlmResponse::text("scripted"));
        let clone = client.clone();

        let response = clone.complete_with_tools(&[Message::user("hi")], &[]).await.unwrap();

        assert_eq!(response.content, "scripted");
        assert_eq!(client.requests().len(), 1);
    }
}

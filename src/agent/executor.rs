//! The tool-calling loop that drives the SQL agent.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::toolkit::{SqlToolkit, ToolError};
use crate::error::{ChatError, Result};
use crate::llm::{LlmClient, Message};

/// Answer returned when the iteration budget runs out.
pub const ITERATION_LIMIT_ANSWER: &str = "Agent stopped due to iteration limit or time limit.";

/// Observation sent back when the model replies with nothing at all.
const EMPTY_REPLY_OBSERVATION: &str =
    "Invalid or incomplete response: reply with a tool call or a final answer.";

/// Loop limits and recovery policy.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorSettings {
    pub max_iterations: usize,
    pub handle_parsing_errors: bool,
}

/// Runs model/tool rounds until the model gives a plain answer.
pub struct AgentExecutor {
    llm: Arc<dyn LlmClient>,
    settings: ExecutorSettings,
}

impl AgentExecutor {
    pub fn new(llm: Arc<dyn LlmClient>, settings: ExecutorSettings) -> Self {
        Self { llm, settings }
    }

    /// Drives the conversation in `messages` to a final answer.
    ///
    /// Tool calls in a reply are executed in order and their results
    /// appended. A reply without tool calls ends the loop.
    pub async fn run(&self, toolkit: &SqlToolkit, mut messages: Vec<Message>) -> Result<String> {
        let tools = toolkit.definitions();
        let start = Instant::now();

        for iteration in 1..=self.settings.max_iterations {
            let response = self.llm.complete_with_tools(&messages, &tools).await?;
            debug!(
                iteration,
                tool_calls = response.tool_calls.len(),
                content_len = response.content.len(),
                "Agent step"
            );

            if !response.has_tool_calls() {
                let answer = response.content.trim();
                if !answer.is_empty() {
                    info!(
                        iterations = iteration,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Agent finished"
                    );
                    return Ok(answer.to_string());
                }

                self.recover(&mut messages, EMPTY_REPLY_OBSERVATION)?;
                continue;
            }

            messages.push(Message::assistant_tool_calls(
                response.content.clone(),
                response.tool_calls.clone(),
            ));

            for call in &response.tool_calls {
                let observation = match toolkit.run(call).await {
                    Ok(output) => output,
                    Err(ToolError::Fatal(e)) => return Err(e),
                    Err(e) => {
                        if !self.settings.handle_parsing_errors {
                            return Err(ChatError::agent(e.to_string()));
                        }
                        warn!(tool = %call.name, error = %e, "Recovering from malformed tool call");
                        e.to_string()
                    }
                };
                messages.push(Message::tool_result(call.id.clone(), observation));
            }
        }

        warn!(
            max_iterations = self.settings.max_iterations,
            "Agent hit iteration limit"
        );
        Ok(ITERATION_LIMIT_ANSWER.to_string())
    }

    /// Feeds a parsing problem back as a user observation, or fails.
    fn recover(&self, messages: &mut Vec<Message>, observation: &str) -> Result<()> {
        if !self.settings.handle_parsing_errors {
            return Err(ChatError::agent("model returned an empty reply"));
        }
        warn!("Recovering from empty model reply");
        messages.push(Message::user(observation));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use crate::db::{MockDatabaseClient, Schema, Table};
    use crate::llm::{LlmResponse, MockLlmClient, Role, ToolCall};
    use pretty_assertions::assert_eq;

    fn settings(max_iterations: usize, handle_parsing_errors: bool) -> ExecutorSettings {
        ExecutorSettings {
            max_iterations,
            handle_parsing_errors,
        }
    }

    fn toolkit(llm: &MockLlmClient) -> SqlToolkit {
        let schema = Schema {
            tables: vec![Table::new("orders")],
            foreign_keys: vec![],
        };
        SqlToolkit::new(
            Box::new(MockDatabaseClient::with_schema(schema)),
            Arc::new(llm.clone()),
            &AgentConfig::default(),
        )
    }

    fn start() -> Vec<Message> {
        vec![Message::system("prefix"), Message::user("How many orders?")]
    }

    #[tokio::test]
    async fn test_plain_answer_ends_loop() {
        let llm = MockLlmClient::new().with_response(LlmResponse::text("There are 3 orders."));
        let executor = AgentExecutor::new(Arc::new(llm.clone()), settings(15, true));

        let answer = executor.run(&toolkit(&llm), start()).await.unwrap();

        assert_eq!(answer, "There are 3 orders.");
        assert_eq!(llm.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_tool_results_are_fed_back() {
        let llm = MockLlmClient::new()
            .with_response(LlmResponse::tool_call("c1", "sql_db_list_tables", serde_json::json!({})))
            .with_response(LlmResponse::text("The only table is orders."));
        let executor = AgentExecutor::new(Arc::new(llm.clone()), settings(15, true));

        let answer = executor.run(&toolkit(&llm), start()).await.unwrap();
        assert_eq!(answer, "The only table is orders.");

        let second = &llm.requests()[1];
        let last = second.last().unwrap();
        assert_eq!(last.role, Role::Tool);
        assert_eq!(last.tool_call_id.as_deref(), Some("c1"));
        assert_eq!(last.content, "orders");
        assert_eq!(second[second.len() - 2].tool_calls.len(), 1);
    }

    #[tokio::test]
    async fn test_multiple_tool_calls_run_in_order() {
        let llm = MockLlmClient::new()
            .with_response(LlmResponse::with_tool_calls(
                "",
                vec![
                    ToolCall::new("a", "sql_db_list_tables", "{}"),
                    ToolCall::new("b", "sql_db_query", r#"{"query":"SELECT 1"}"#),
                ],
            ))
            .with_response(LlmResponse::text("done"));
        let executor = AgentExecutor::new(Arc::new(llm.clone()), settings(15, true));

        executor.run(&toolkit(&llm), start()).await.unwrap();

        let ids: Vec<String> = llm.requests()[1]
            .iter()
            .filter(|m| m.role == Role::Tool)
            .filter_map(|m| m.tool_call_id.clone())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_unknown_tool_recovers() {
        let llm = MockLlmClient::new()
            .with_response(LlmResponse::tool_call("c1", "sql_db_drop", serde_json::json!({})))
            .with_response(LlmResponse::text("Recovered."));
        let executor = AgentExecutor::new(Arc::new(llm.clone()), settings(15, true));

        let answer = executor.run(&toolkit(&llm), start()).await.unwrap();

        assert_eq!(answer, "Recovered.");
        let requests = llm.requests();
        let observation = &requests[1].last().unwrap().content;
        assert!(observation.contains("sql_db_drop is not a valid tool"));
    }

    #[tokio::test]
    async fn test_malformed_arguments_fail_without_recovery() {
        let llm = MockLlmClient::new().with_response(LlmResponse::with_tool_calls(
            "",
            vec![ToolCall::new("c1", "sql_db_query", "SELECT 1")],
        ));
        let executor = AgentExecutor::new(Arc::new(llm.clone()), settings(15, false));

        let err = executor.run(&toolkit(&llm), start()).await.unwrap_err();
        assert!(matches!(err, ChatError::Agent(_)));
    }

    #[tokio::test]
    async fn test_empty_reply_recovers() {
        let llm = MockLlmClient::new()
            .with_response(LlmResponse::text("   "))
            .with_response(LlmResponse::text("Answer."));
        let executor = AgentExecutor::new(Arc::new(llm.clone()), settings(15, true));

        let answer = executor.run(&toolkit(&llm), start()).await.unwrap();

        assert_eq!(answer, "Answer.");
        assert_eq!(
            llm.requests()[1].last().unwrap().content,
            EMPTY_REPLY_OBSERVATION
        );
    }

    #[tokio::test]
    async fn test_empty_reply_without_recovery_fails() {
        let llm = MockLlmClient::new().with_response(LlmResponse::text(""));
        let executor = AgentExecutor::new(Arc::new(llm.clone()), settings(15, false));

        let err = executor.run(&toolkit(&llm), start()).await.unwrap_err();
        assert_eq!(err.to_string(), "Agent error: model returned an empty reply");
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let mut llm = MockLlmClient::new();
        for i in 0..3 {
            llm = llm.with_response(LlmResponse::tool_call(
                &format!("c{i}"),
                "sql_db_list_tables",
                serde_json::json!({}),
            ));
        }
        let executor = AgentExecutor::new(Arc::new(llm.clone()), settings(3, true));

        let answer = executor.run(&toolkit(&llm), start()).await.unwrap();

        assert_eq!(answer, ITERATION_LIMIT_ANSWER);
        assert_eq!(llm.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_llm_error_propagates() {
        let llm = MockLlmClient::failing("Rate limited. Please wait and try again.");
        let executor = AgentExecutor::new(Arc::new(llm.clone()), settings(15, true));

        let err = executor.run(&toolkit(&llm), start()).await.unwrap_err();
        assert!(matches!(err, ChatError::Llm(_)));
    }
}

//! Agent integration tests.
//!
//! A scripted LLM drives the real tool loop against a SQLite file.

use super::create_shop_db;
use sqlchat::agent::{AgentFactory, ITERATION_LIMIT_ANSWER};
use sqlchat::config::{AgentConfig, ConnectionConfig};
use sqlchat::connection;
use sqlchat::llm::{LlmResponse, MockLlmClient, Role};
use sqlchat::session::Turn;
use std::sync::Arc;
use tempfile::TempDir;

async fn shop_agent(
    dir: &TempDir,
    llm: &MockLlmClient,
    config: AgentConfig,
) -> sqlchat::agent::AgentSession {
    let path = create_shop_db(dir.path()).await;
    let (handle, _) = connection::build(&ConnectionConfig::sqlite(&path))
        .await
        .unwrap();
    AgentFactory::with_llm(Arc::new(llm.clone()), config)
        .create(handle)
        .unwrap()
}

#[tokio::test]
async fn test_agent_runs_sql_and_answers() {
    let dir = TempDir::new().unwrap();
    let llm = MockLlmClient::new()
        .with_response(LlmResponse::tool_call(
            "call_1",
            "sql_db_query",
            serde_json::json!({ "query": "SELECT COUNT(*) FROM orders" }),
        ))
        .with_response(LlmResponse::text("There are 3 orders."));
    let agent = shop_agent(&dir, &llm, AgentConfig::default()).await;

    let answer = agent.invoke(&[], "How many orders are there?").await.unwrap();

    assert_eq!(answer, "There are 3 orders.");
    let second = &llm.requests()[1];
    let observation = second.last().unwrap();
    assert_eq!(observation.role, Role::Tool);
    assert_eq!(observation.content, "[(3,)]");

    agent.close().await.unwrap();
}

#[tokio::test]
async fn test_agent_default_mock_lists_tables() {
    let dir = TempDir::new().unwrap();
    let llm = MockLlmClient::new();
    let agent = shop_agent(&dir, &llm, AgentConfig::default()).await;

    let answer = agent.invoke(&[], "What is in here?").await.unwrap();

    assert_eq!(
        answer,
        "The database contains the following tables: customers, orders"
    );
    agent.close().await.unwrap();
}

#[tokio::test]
async fn test_agent_sees_prior_turns() {
    let dir = TempDir::new().unwrap();
    let llm = MockLlmClient::new().with_response(LlmResponse::text("Grace has 1 order."));
    let agent = shop_agent(&dir, &llm, AgentConfig::default()).await;

    let history = vec![
        Turn::ai("Hello! I'm connected to Your SQLite DB: shop.db. How can I help you?"),
        Turn::human("Who is customer 2?"),
        Turn::ai("Customer 2 is Grace."),
    ];
    agent.invoke(&history, "How many orders does she have?").await.unwrap();

    let sent = &llm.requests()[0];
    assert_eq!(sent[0].role, Role::System);
    assert!(sent.iter().any(|m| m.role == Role::User && m.content == "Who is customer 2?"));
    assert!(sent
        .iter()
        .any(|m| m.role == Role::Assistant && m.content == "Customer 2 is Grace."));
    assert!(sent
        .iter()
        .any(|m| m.role == Role::User && m.content == "How many orders does she have?"));

    agent.close().await.unwrap();
}

#[tokio::test]
async fn test_agent_stops_at_iteration_limit() {
    let dir = TempDir::new().unwrap();
    let mut llm = MockLlmClient::new();
    for i in 0..3 {
        llm = llm.with_response(LlmResponse::tool_call(
            &format!("call_{i}"),
            "sql_db_list_tables",
            serde_json::json!({}),
        ));
    }
    let config = AgentConfig {
        max_iterations: 2,
        ..AgentConfig::default()
    };
    let agent = shop_agent(&dir, &llm, config).await;

    let answer = agent.invoke(&[], "Loop forever").await.unwrap();

    assert_eq!(answer, ITERATION_LIMIT_ANSWER);
    assert_eq!(llm.requests().len(), 2);
    agent.close().await.unwrap();
}

#[tokio::test]
async fn test_agent_recovers_from_bad_arguments() {
    let dir = TempDir::new().unwrap();
    let llm = MockLlmClient::new()
        .with_response(LlmResponse::tool_call(
            "call_1",
            "sql_db_query",
            serde_json::json!({ "sql": "SELECT 1" }),
        ))
        .with_response(LlmResponse::text("Sorry, done."));
    let agent = shop_agent(&dir, &llm, AgentConfig::default()).await;

    let answer = agent.invoke(&[], "Anything").await.unwrap();

    assert_eq!(answer, "Sorry, done.");
    let observation = llm.requests()[1].last().cloned().unwrap();
    assert_eq!(observation.role, Role::Tool);
    agent.close().await.unwrap();
}

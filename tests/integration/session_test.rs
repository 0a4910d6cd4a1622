//! Session lifecycle integration tests.
//!
//! Covers connecting, asking, reconnecting and cleanup of staged copies.

use super::create_shop_db;
use sqlchat::agent::AgentFactory;
use sqlchat::config::{AgentConfig, ConnectionConfig};
use sqlchat::db::Value;
use sqlchat::error::ChatError;
use sqlchat::llm::{LlmResponse, LlmSettings, MockLlmClient};
use sqlchat::session::{BannerLevel, SessionState, Turn, TurnRole};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn staged_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("temp_"))
        .count()
}

#[tokio::test]
async fn test_connect_and_ask() {
    let data = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    let path = create_shop_db(data.path()).await;
    let factory = AgentFactory::new(LlmSettings::mock(), AgentConfig::default());
    let mut session = SessionState::with_staging_dir(staging.path());

    let banner = session.connect(&ConnectionConfig::sqlite(&path), &factory).await;
    assert_eq!(banner.level, BannerLevel::Success);
    assert_eq!(banner.text, "Connected to Your SQLite DB: shop.db!");

    let answer = session.ask("What tables are there?").await.unwrap();

    assert_eq!(
        answer,
        "The database contains the following tables: customers, orders"
    );
    let history = session.history();
    assert_eq!(history.len(), 3);
    assert_eq!(
        history[0],
        Turn::ai("Hello! I'm connected to Your SQLite DB: shop.db. How can I help you?")
    );
    assert_eq!(history[1], Turn::human("What tables are there?"));
    assert_eq!(history[2].role, TurnRole::Ai);

    session.close().await;
}

#[tokio::test]
async fn test_writes_land_in_staged_copy_only() {
    let data = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    let path = create_shop_db(data.path()).await;
    let llm = MockLlmClient::new()
        .with_response(LlmResponse::tool_call(
            "call_1",
            "sql_db_query",
            serde_json::json!({ "query": "DELETE FROM orders" }),
        ))
        .with_response(LlmResponse::text("All orders deleted."));
    let factory = AgentFactory::with_llm(Arc::new(llm), AgentConfig::default());
    let mut session = SessionState::with_staging_dir(staging.path());

    session.connect(&ConnectionConfig::sqlite(&path), &factory).await;
    session.ask("Delete every order").await.unwrap();

    let staged = session.active().and_then(|a| a.staged()).unwrap();
    assert_ne!(staged.path(), path.as_path());
    session.close().await;

    let (handle, _) = sqlchat::connection::build(&ConnectionConfig::sqlite(&path))
        .await
        .unwrap();
    let result = handle.execute_query("SELECT COUNT(*) FROM orders").await.unwrap();
    assert_eq!(result.rows, vec![vec![Value::Int(3)]]);
    handle.close().await.unwrap();
}

#[tokio::test]
async fn test_reconnect_starts_fresh_transcript() {
    let first_dir = TempDir::new().unwrap();
    let second_dir = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    let first = create_shop_db(first_dir.path()).await;
    let second = second_dir.path().join("archive.db");
    std::fs::copy(&first, &second).unwrap();

    let factory = AgentFactory::new(LlmSettings::mock(), AgentConfig::default());
    let mut session = SessionState::with_staging_dir(staging.path());

    session.connect(&ConnectionConfig::sqlite(&first), &factory).await;
    session.ask("What tables are there?").await.unwrap();
    assert_eq!(session.history().len(), 3);

    let banner = session.connect(&ConnectionConfig::sqlite(&second), &factory).await;

    assert_eq!(banner.text, "Connected to Your SQLite DB: archive.db!");
    assert_eq!(session.db_name(), Some("Your SQLite DB: archive.db"));
    assert_eq!(session.history().len(), 1);
    assert_eq!(staged_entries(staging.path()), 1);

    session.close().await;
    assert_eq!(staged_entries(staging.path()), 0);
}

#[tokio::test]
async fn test_failed_upload_leaves_no_staged_copy() {
    let data = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    let path = data.path().join("broken.db");
    std::fs::write(&path, vec![7u8; 4096]).unwrap();
    let factory = AgentFactory::new(LlmSettings::mock(), AgentConfig::default());
    let mut session = SessionState::with_staging_dir(staging.path());

    let banner = session.connect(&ConnectionConfig::sqlite(&path), &factory).await;

    assert_eq!(banner.level, BannerLevel::Error);
    assert!(banner.text.starts_with("DB Connection Error: "));
    assert!(!session.is_connected());
    assert_eq!(staged_entries(staging.path()), 0);
}

#[tokio::test]
async fn test_ask_before_connect() {
    let mut session = SessionState::with_staging_dir(std::env::temp_dir());

    let result = session.ask("Anyone there?").await;

    assert!(matches!(result, Err(ChatError::NotConnected)));
    assert!(session.history().is_empty());
}

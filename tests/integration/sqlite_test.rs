//! SQLite integration tests.
//!
//! Exercises connection building and the agent's database tools against a
//! real database file.

use super::create_shop_db;
use sqlchat::agent::SqlToolkit;
use sqlchat::config::{AgentConfig, ConnectionConfig};
use sqlchat::connection;
use sqlchat::db::{DatabaseBackend, Value};
use sqlchat::error::ChatError;
use sqlchat::llm::MockLlmClient;
use std::sync::Arc;
use tempfile::TempDir;

async fn shop_toolkit(dir: &TempDir) -> SqlToolkit {
    let path = create_shop_db(dir.path()).await;
    let (handle, _) = connection::build(&ConnectionConfig::sqlite(&path))
        .await
        .unwrap();
    SqlToolkit::new(handle, Arc::new(MockLlmClient::new()), &AgentConfig::default())
}

#[tokio::test]
async fn test_build_sqlite_handle() {
    let dir = TempDir::new().unwrap();
    let path = create_shop_db(dir.path()).await;

    let (handle, display_name) = connection::build(&ConnectionConfig::sqlite(&path))
        .await
        .unwrap();

    assert_eq!(display_name, "Your SQLite DB: shop.db");
    assert_eq!(handle.backend(), DatabaseBackend::Sqlite);
    assert_eq!(handle.list_tables().await.unwrap(), vec!["customers", "orders"]);

    handle.close().await.unwrap();
}

#[tokio::test]
async fn test_build_rejects_non_database_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.db");
    std::fs::write(&path, "this is not a database, just some text padding it out").unwrap();

    let result = connection::build(&ConnectionConfig::sqlite(&path)).await;

    assert!(matches!(result, Err(ChatError::Connection(_))));
}

#[tokio::test]
async fn test_build_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.db");

    let result = connection::build(&ConnectionConfig::sqlite(&path)).await;

    assert!(matches!(result, Err(ChatError::Connection(_))));
    assert!(!path.exists());
}

#[tokio::test]
async fn test_query_through_handle() {
    let dir = TempDir::new().unwrap();
    let path = create_shop_db(dir.path()).await;
    let (handle, _) = connection::build(&ConnectionConfig::sqlite(&path))
        .await
        .unwrap();

    let result = handle
        .execute_query(
            "SELECT c.name, COUNT(*) AS orders FROM customers c \
             JOIN orders o ON o.customer_id = c.id GROUP BY c.name ORDER BY c.name",
        )
        .await
        .unwrap();

    assert_eq!(result.columns[0].name, "name");
    assert_eq!(result.columns[1].name, "orders");
    assert_eq!(
        result.rows,
        vec![
            vec![Value::String("Ada".to_string()), Value::Int(2)],
            vec![Value::String("Grace".to_string()), Value::Int(1)],
        ]
    );

    handle.close().await.unwrap();
}

#[tokio::test]
async fn test_toolkit_list_tables() {
    let dir = TempDir::new().unwrap();
    let toolkit = shop_toolkit(&dir).await;

    assert_eq!(toolkit.list_tables().await, "customers, orders");
    toolkit.close().await.unwrap();
}

#[tokio::test]
async fn test_toolkit_schema_with_sample_rows() {
    let dir = TempDir::new().unwrap();
    let toolkit = shop_toolkit(&dir).await;

    let schema = toolkit.schema("orders").await;

    assert!(schema.starts_with("CREATE TABLE orders ("));
    assert!(schema.contains("\tPRIMARY KEY (id)"));
    assert!(schema.contains("\tFOREIGN KEY(customer_id) REFERENCES customers (id)"));
    assert!(schema.contains("3 rows from orders table:"));
    assert!(schema.contains("id\tcustomer_id\ttotal"));
    toolkit.close().await.unwrap();
}

#[tokio::test]
async fn test_toolkit_schema_unknown_table() {
    let dir = TempDir::new().unwrap();
    let toolkit = shop_toolkit(&dir).await;

    let schema = toolkit.schema("orders, invoices").await;

    assert_eq!(schema, "Error: table_names {'invoices'} not found in database");
    toolkit.close().await.unwrap();
}

#[tokio::test]
async fn test_toolkit_query() {
    let dir = TempDir::new().unwrap();
    let toolkit = shop_toolkit(&dir).await;

    assert_eq!(toolkit.query("SELECT COUNT(*) FROM orders").await, "[(3,)]");
    assert_eq!(
        toolkit.query("SELECT name FROM customers ORDER BY id").await,
        "[('Ada',), ('Grace',)]"
    );
    toolkit.close().await.unwrap();
}

#[tokio::test]
async fn test_toolkit_query_error_is_observation() {
    let dir = TempDir::new().unwrap();
    let toolkit = shop_toolkit(&dir).await;

    let output = toolkit.query("SELECT missing_column FROM orders").await;

    assert!(output.starts_with("Error: "));
    assert!(output.contains("missing_column"));
    toolkit.close().await.unwrap();
}

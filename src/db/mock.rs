//! Mock database clients for testing.
//!
//! `MockDatabaseClient` serves a fixed schema and canned query results;
//! `FailingDatabaseClient` fails every operation.

use super::{ColumnInfo, DatabaseBackend, DatabaseClient, QueryResult, Schema, Value};
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A mock database client that returns predefined results.
pub struct MockDatabaseClient {
    backend: DatabaseBackend,
    schema: Schema,
    responses: HashMap<String, QueryResult>,
    executed: Mutex<Vec<String>>,
    closed: Arc<AtomicBool>,
}

impl MockDatabaseClient {
    /// Creates a new mock database client with an empty schema.
    pub fn new() -> Self {
        Self {
            backend: DatabaseBackend::Sqlite,
            schema: Schema::default(),
            responses: HashMap::new(),
            executed: Mutex::new(Vec::new()),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates a new mock database client with the given schema.
    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema,
            ..Self::new()
        }
    }

    /// Reports a different backend (affects dialect and quoting).
    pub fn with_backend(mut self, backend: DatabaseBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Registers the result returned for an exact SQL string.
    pub fn with_response(mut self, sql: impl Into<String>, result: QueryResult) -> Self {
        self.responses.insert(sql.into(), result);
        self
    }

    /// Returns every SQL string executed so far, in order.
    pub fn executed_queries(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|queries| queries.clone())
            .unwrap_or_default()
    }

    /// Returns a flag that flips to true once `close` has been called.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.schema.tables.iter().map(|t| t.name.clone()).collect();
        names.sort();
        Ok(names)
    }

    async fn introspect_schema(&self) -> Result<Schema> {
        Ok(self.schema.clone())
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(sql.to_string());
        }

        if let Some(result) = self.responses.get(sql.trim()) {
            return Ok(result.clone());
        }

        if sql.trim_start().to_uppercase().starts_with("SELECT") {
            let mut result = QueryResult::with_data(
                vec![ColumnInfo::new("result", "TEXT")],
                vec![vec![Value::String(format!("Mock result for: {sql}"))]],
            );
            result.execution_time = Duration::from_millis(1);
            Ok(result)
        } else {
            Ok(QueryResult::new())
        }
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// A database client whose every operation fails with the same message.
pub struct FailingDatabaseClient {
    message: String,
}

impl FailingDatabaseClient {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Sqlite
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        Err(ChatError::query(self.message.clone()))
    }

    async fn introspect_schema(&self) -> Result<Schema> {
        Err(ChatError::query(self.message.clone()))
    }

    async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
        Err(ChatError::query(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Column, Table};

    #[tokio::test]
    async fn test_mock_select() {
        let client = MockDatabaseClient::new();
        let result = client.execute_query("SELECT 1").await.unwrap();
        assert_eq!(result.row_count, 1);
        assert_eq!(result.columns.len(), 1);
        assert_eq!(client.executed_queries(), vec!["SELECT 1"]);
    }

    #[tokio::test]
    async fn test_mock_canned_response() {
        let canned = QueryResult::with_data(
            vec![ColumnInfo::new("count", "INTEGER")],
            vec![vec![Value::Int(42)]],
        );
        let client =
            MockDatabaseClient::new().with_response("SELECT COUNT(*) FROM orders", canned);

        let result = client
            .execute_query("SELECT COUNT(*) FROM orders")
            .await
            .unwrap();
        assert_eq!(result.rows, vec![vec![Value::Int(42)]]);
    }

    #[tokio::test]
    async fn test_mock_lists_schema_tables() {
        let schema = Schema {
            tables: vec![
                Table::new("orders").with_column(Column::new("id", "INTEGER")),
                Table::new("customers"),
            ],
            foreign_keys: vec![],
        };
        let client = MockDatabaseClient::with_schema(schema);
        assert_eq!(client.list_tables().await.unwrap(), vec!["customers", "orders"]);
    }

    #[tokio::test]
    async fn test_mock_close_sets_flag() {
        let client = MockDatabaseClient::new();
        let flag = client.closed_flag();
        client.close().await.unwrap();
        assert!(flag.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_failing_client() {
        let client = FailingDatabaseClient::new("disk I/O error");
        let err = client.list_tables().await.unwrap_err();
        assert_eq!(err.to_string(), "Query error: disk I/O error");
    }
}

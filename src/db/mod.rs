//! Database abstraction layer for sqlchat.
//!
//! Provides a trait-based interface for database operations, allowing
//! SQLite and MySQL backends to be used interchangeably by the agent.

mod mock;
mod mysql;
mod schema;
mod sqlite;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use mysql::MySqlClient;
pub use schema::{Column, ForeignKey, Schema, Table};
pub use sqlite::SqliteClient;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::error::{ChatError, Result};
use async_trait::async_trait;

/// Query timeout in seconds.
pub(crate) const QUERY_TIMEOUT_SECS: u64 = 30;

/// Maximum rows to return from a query.
pub(crate) const MAX_ROWS: usize = 1000;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    MySql,
}

impl DatabaseBackend {
    /// Returns the backend as a lowercase identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::MySql => "mysql",
        }
    }

    /// Returns the SQL dialect name used in prompts.
    pub fn dialect(&self) -> &'static str {
        match self {
            Self::Sqlite => "SQLite",
            Self::MySql => "MySQL",
        }
    }

    /// Returns the URL scheme for this backend.
    pub fn url_scheme(&self) -> &'static str {
        self.as_str()
    }

    /// Returns the default port for this backend, if it has one.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::Sqlite => None,
            Self::MySql => Some(3306),
        }
    }

    /// Quotes an identifier for use in generated SQL.
    pub fn quote_identifier(&self, ident: &str) -> String {
        match self {
            Self::Sqlite => format!("\"{}\"", ident.replace('"', "\"\"")),
            Self::MySql => format!("`{}`", ident.replace('`', "``")),
        }
    }

    /// Detects the backend from a connection URI.
    pub fn from_uri(uri: &str) -> Option<Self> {
        let scheme = uri.split(':').next()?;
        match scheme.to_lowercase().as_str() {
            "sqlite" => Some(Self::Sqlite),
            "mysql" => Some(Self::MySql),
            _ => None,
        }
    }
}

impl std::fmt::Display for DatabaseBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect())
    }
}

/// Opens a database handle for the given connection URI.
///
/// This is the central factory function for database connections.
pub async fn connect(uri: &str) -> Result<Box<dyn DatabaseClient>> {
    match DatabaseBackend::from_uri(uri) {
        Some(DatabaseBackend::Sqlite) => Ok(Box::new(SqliteClient::connect(uri).await?)),
        Some(DatabaseBackend::MySql) => Ok(Box::new(MySqlClient::connect(uri).await?)),
        None => Err(ChatError::config(format!(
            "Unsupported database type in '{}'",
            uri.split(':').next().unwrap_or(uri)
        ))),
    }
}

/// Trait defining the interface for database clients.
///
/// All database operations are async and return Results with ChatError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Returns the backend this client talks to.
    fn backend(&self) -> DatabaseBackend;

    /// Lists the names of all user tables, sorted.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Introspects the database schema, returning table and relationship information.
    async fn introspect_schema(&self) -> Result<Schema>;

    /// Executes a SQL query and returns the results.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}

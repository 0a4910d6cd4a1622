//! MySQL database client implementation.
//!
//! Provides the `MySqlClient` struct that implements the `DatabaseClient`
//! trait for MySQL servers using sqlx. Introspection is scoped to the
//! database named in the connection URI.

use super::{MAX_ROWS, QUERY_TIMEOUT_SECS};
use crate::db::{
    Column, ColumnInfo, DatabaseBackend, DatabaseClient, ForeignKey, QueryResult, Row, Schema,
    Table, Value,
};
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, TypeInfo, ValueRef};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

/// MySQL database client.
#[derive(Debug)]
pub struct MySqlClient {
    pool: MySqlPool,
}

impl MySqlClient {
    /// Connects to the server addressed by a `mysql://` URI.
    pub async fn connect(uri: &str) -> Result<Self> {
        let target = describe_target(uri);
        debug!(target = %target, "Connecting to MySQL");

        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .connect(uri)
            .await
            .map_err(|e| map_connection_error(e, &target))?;

        debug!("Successfully connected to MySQL");
        Ok(Self { pool })
    }

    async fn fetch_table(&self, name: String) -> Result<Table> {
        let rows: Vec<(String, String, String, Option<String>, String)> = sqlx::query_as(
            r#"
            SELECT
                CAST(column_name AS CHAR),
                CAST(column_type AS CHAR),
                CAST(is_nullable AS CHAR),
                CAST(column_default AS CHAR),
                CAST(column_key AS CHAR)
            FROM information_schema.columns
            WHERE table_schema = DATABASE() AND table_name = ?
            ORDER BY ordinal_position
            "#,
        )
        .bind(&name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatError::query(format!("Failed to fetch columns for {name}: {e}")))?;

        let mut primary_key = Vec::new();
        let columns = rows
            .into_iter()
            .map(|(column_name, data_type, is_nullable, default, key)| {
                if key == "PRI" {
                    primary_key.push(column_name.clone());
                }
                Column {
                    name: column_name,
                    data_type: data_type.to_uppercase(),
                    is_nullable: is_nullable == "YES",
                    default,
                }
            })
            .collect();

        Ok(Table {
            name,
            columns,
            primary_key,
        })
    }

    async fn fetch_foreign_keys(&self) -> Result<Vec<ForeignKey>> {
        let rows: Vec<(String, String, String, String, String)> = sqlx::query_as(
            r#"
            SELECT
                CAST(constraint_name AS CHAR),
                CAST(table_name AS CHAR),
                CAST(column_name AS CHAR),
                CAST(referenced_table_name AS CHAR),
                CAST(referenced_column_name AS CHAR)
            FROM information_schema.key_column_usage
            WHERE table_schema = DATABASE() AND referenced_table_name IS NOT NULL
            ORDER BY table_name, constraint_name, ordinal_position
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatError::query(format!("Failed to fetch foreign keys: {e}")))?;

        let mut grouped: BTreeMap<(String, String), ForeignKey> = BTreeMap::new();
        for (constraint, from_table, from_column, to_table, to_column) in rows {
            let fk = grouped
                .entry((from_table.clone(), constraint))
                .or_insert_with(|| ForeignKey::new(from_table, Vec::new(), to_table, Vec::new()));
            fk.from_columns.push(from_column);
            fk.to_columns.push(to_column);
        }

        Ok(grouped.into_values().collect())
    }

    async fn fetch_column_metadata(&self, sql: &str) -> Vec<ColumnInfo> {
        match (&self.pool).describe(sql).await {
            Ok(describe) => describe
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait]
impl DatabaseClient for MySqlClient {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::MySql
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(
            r#"
            SELECT CAST(table_name AS CHAR)
            FROM information_schema.tables
            WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatError::query(format_query_error(e)))
    }

    async fn introspect_schema(&self) -> Result<Schema> {
        let names = self.list_tables().await?;
        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            tables.push(self.fetch_table(name).await?);
        }

        Ok(Schema {
            tables,
            foreign_keys: self.fetch_foreign_keys().await?,
        })
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        let result = tokio::time::timeout(
            Duration::from_secs(QUERY_TIMEOUT_SECS),
            sqlx::query(sql).fetch_all(&self.pool),
        )
        .await
        .map_err(|_| {
            ChatError::query(format!(
                "Query timed out after {QUERY_TIMEOUT_SECS} seconds"
            ))
        })?
        .map_err(|e| ChatError::query(format_query_error(e)))?;

        let execution_time = start.elapsed();

        let columns: Vec<ColumnInfo> = match result.first() {
            Some(first_row) => first_row
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            None => self.fetch_column_metadata(sql).await,
        };

        let total_rows = result.len();
        let was_truncated = total_rows > MAX_ROWS;
        if was_truncated {
            warn!(total_rows, max_rows = MAX_ROWS, "Truncating query result");
        }

        let rows: Vec<Row> = result.iter().take(MAX_ROWS).map(convert_row).collect();
        let row_count = rows.len();

        Ok(QueryResult {
            columns,
            rows,
            execution_time,
            row_count,
            total_rows,
            was_truncated,
        })
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Connection target without credentials, for logs and error messages.
fn describe_target(uri: &str) -> String {
    match Url::parse(uri) {
        Ok(url) => format!(
            "{}:{}{}",
            url.host_str().unwrap_or("localhost"),
            url.port().unwrap_or(3306),
            url.path()
        ),
        Err(_) => "MySQL server".to_string(),
    }
}

fn convert_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a MySqlRow to our Value type.
fn convert_value(row: &MySqlRow, index: usize, type_name: &str) -> Value {
    if row.try_get_raw(index).map(|raw| raw.is_null()).unwrap_or(true) {
        return Value::Null;
    }

    let upper = type_name.to_uppercase();
    let value = match upper.as_str() {
        "BOOLEAN" => row.try_get::<bool, _>(index).ok().map(Value::Bool),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            row.try_get::<i64, _>(index).ok().map(Value::Int)
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => row.try_get::<u64, _>(index).ok().map(|v| {
            i64::try_from(v)
                .map(Value::Int)
                .unwrap_or_else(|_| Value::String(v.to_string()))
        }),
        "FLOAT" => row
            .try_get::<f32, _>(index)
            .ok()
            .map(|v| Value::Float(v as f64)),
        "DOUBLE" => row.try_get::<f64, _>(index).ok().map(Value::Float),
        "DATE" => row
            .try_get::<chrono::NaiveDate, _>(index)
            .ok()
            .map(|v| Value::String(v.to_string())),
        "DATETIME" => row
            .try_get::<chrono::NaiveDateTime, _>(index)
            .ok()
            .map(|v| Value::String(v.to_string())),
        "TIMESTAMP" => row
            .try_get::<chrono::DateTime<chrono::Utc>, _>(index)
            .ok()
            .map(|v| Value::String(v.to_string())),
        "TIME" => row
            .try_get::<chrono::NaiveTime, _>(index)
            .ok()
            .map(|v| Value::String(v.to_string())),
        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" => row
            .try_get::<Vec<u8>, _>(index)
            .ok()
            .map(|bytes| match String::from_utf8(bytes) {
                Ok(text) => Value::String(text),
                Err(e) => Value::Bytes(e.into_bytes()),
            }),
        // DECIMAL, JSON, ENUM, SET and text types all arrive as strings.
        _ => row.try_get_unchecked::<String, _>(index).ok().map(Value::String),
    };

    value.unwrap_or(Value::Null)
}

/// Maps sqlx connection errors to user-facing messages.
///
/// Well-known failures get a short explanation; the library message is
/// always kept.
fn map_connection_error(error: sqlx::Error, target: &str) -> ChatError {
    let message = match error.as_database_error() {
        Some(db_error) => db_error.message().to_string(),
        None => error.to_string(),
    };
    let lower = message.to_lowercase();

    if lower.contains("connection refused") {
        ChatError::connection(format!(
            "Cannot connect to {target}. Check that the server is running. ({message})"
        ))
    } else if lower.contains("access denied") {
        ChatError::connection(format!("Authentication failed: {message}"))
    } else if lower.contains("unknown database") {
        ChatError::connection(format!("Database does not exist: {message}"))
    } else {
        ChatError::connection(message)
    }
}

fn format_query_error(error: sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => match db_error.code() {
            Some(code) => format!("({code}) {}", db_error.message()),
            None => db_error.message().to_string(),
        },
        None => error.to_string(),
    }
}

//! SQLite database client implementation.
//!
//! Provides the `SqliteClient` struct that implements the `DatabaseClient`
//! trait for SQLite database files using sqlx.

use super::{MAX_ROWS, QUERY_TIMEOUT_SECS};
use crate::db::{
    Column, ColumnInfo, DatabaseBackend, DatabaseClient, ForeignKey, QueryResult, Row, Schema,
    Table, Value,
};
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, TypeInfo, ValueRef};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// SQLite database client.
#[derive(Debug)]
pub struct SqliteClient {
    pool: SqlitePool,
}

impl SqliteClient {
    /// Opens the database file addressed by a `sqlite:///<path>` URI.
    ///
    /// The file must already exist; it is never created.
    pub async fn connect(uri: &str) -> Result<Self> {
        let path = path_from_uri(uri)?;
        debug!(path = %path.display(), "Opening SQLite database");

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(map_connection_error)?;

        Ok(Self { pool })
    }

    async fn fetch_table(&self, name: String) -> Result<Table> {
        let rows: Vec<(String, String, i64, Option<String>, i64)> = sqlx::query_as(
            r#"SELECT name, type, "notnull", dflt_value, pk FROM pragma_table_info(?) ORDER BY cid"#,
        )
        .bind(&name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatError::query(format!("Failed to fetch columns for {name}: {e}")))?;

        let mut pk_columns: Vec<(i64, String)> = Vec::new();
        let columns = rows
            .into_iter()
            .map(|(column_name, data_type, not_null, default, pk)| {
                if pk > 0 {
                    pk_columns.push((pk, column_name.clone()));
                }
                Column {
                    name: column_name,
                    data_type,
                    is_nullable: not_null == 0,
                    default,
                }
            })
            .collect();
        pk_columns.sort();

        Ok(Table {
            name,
            columns,
            primary_key: pk_columns.into_iter().map(|(_, c)| c).collect(),
        })
    }

    async fn fetch_foreign_keys(&self, table_name: &str) -> Result<Vec<ForeignKey>> {
        let rows: Vec<(i64, String, String, Option<String>)> = sqlx::query_as(
            r#"SELECT id, "table", "from", "to" FROM pragma_foreign_key_list(?) ORDER BY id, seq"#,
        )
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            ChatError::query(format!("Failed to fetch foreign keys for {table_name}: {e}"))
        })?;

        // One entry per constraint id; multi-column keys share an id.
        let mut grouped: BTreeMap<i64, ForeignKey> = BTreeMap::new();
        for (id, to_table, from_column, to_column) in rows {
            let fk = grouped
                .entry(id)
                .or_insert_with(|| ForeignKey::new(table_name, Vec::new(), to_table, Vec::new()));
            fk.from_columns.push(from_column);
            // A NULL target means the referenced table's primary key.
            fk.to_columns.push(to_column.unwrap_or_else(|| "rowid".to_string()));
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
impl DatabaseClient for SqliteClient {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Sqlite
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(
            r#"
            SELECT name FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatError::query(format_query_error(e)))
    }

    async fn introspect_schema(&self) -> Result<Schema> {
        let names = self.list_tables().await?;
        let mut schema = Schema::new();

        for name in names {
            let foreign_keys = self.fetch_foreign_keys(&name).await?;
            schema.foreign_keys.extend(foreign_keys);
            schema.tables.push(self.fetch_table(name).await?);
        }

        Ok(schema)
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

        debug!(row_count, elapsed_ms = execution_time.as_millis() as u64, "SQLite query finished");

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

/// Extracts the file path from a `sqlite:` URI.
///
/// `sqlite:///shop.db` is relative, `sqlite:////var/data/shop.db` absolute.
fn path_from_uri(uri: &str) -> Result<PathBuf> {
    let path = uri
        .strip_prefix("sqlite:///")
        .or_else(|| uri.strip_prefix("sqlite://"))
        .or_else(|| uri.strip_prefix("sqlite:"))
        .ok_or_else(|| ChatError::config(format!("Not a SQLite URI: '{uri}'")))?;

    if path.is_empty() {
        return Err(ChatError::config("SQLite file path is required."));
    }
    Ok(PathBuf::from(path))
}

fn convert_row(row: &SqliteRow) -> Row {
    (0..row.columns().len())
        .map(|i| convert_value(row, i))
        .collect()
}

/// Converts one column value using its runtime storage class.
///
/// SQLite is dynamically typed, so the declared column type is only a hint.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    let storage_class = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_uppercase(),
        Err(_) => return Value::Null,
    };

    match storage_class.as_str() {
        "INTEGER" => row
            .try_get_unchecked::<i64, _>(index)
            .map(Value::Int)
            .unwrap_or(Value::Null),
        "BOOLEAN" => row
            .try_get_unchecked::<bool, _>(index)
            .map(Value::Bool)
            .unwrap_or(Value::Null),
        "REAL" => row
            .try_get_unchecked::<f64, _>(index)
            .map(Value::Float)
            .unwrap_or(Value::Null),
        "BLOB" => row
            .try_get_unchecked::<Vec<u8>, _>(index)
            .map(Value::Bytes)
            .unwrap_or(Value::Null),
        _ => row
            .try_get_unchecked::<String, _>(index)
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

/// Keeps the library message; SQLite errors are already specific.
fn map_connection_error(error: sqlx::Error) -> ChatError {
    match error.as_database_error() {
        Some(db_error) => ChatError::connection(db_error.message().to_string()),
        None => ChatError::connection(error.to_string()),
    }
}

fn format_query_error(error: sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => db_error.message().to_string(),
        None => error.to_string(),
    }
}

//! Builds database handles from connection parameters.

use crate::config::ConnectionConfig;
use crate::db::{self, DatabaseClient};
use crate::error::{ChatError, Result};
use tracing::{debug, info, warn};

/// Opens a database handle for `config`.
///
/// Returns the handle together with the name shown to the user. The handle
/// is probed by listing tables, so an unreadable or corrupt file fails here
/// rather than on the first question. MySQL field presence is not checked;
/// callers gate on [`ConnectionConfig::validate`].
pub async fn build(config: &ConnectionConfig) -> Result<(Box<dyn DatabaseClient>, String)> {
    if let ConnectionConfig::Sqlite { path } = config {
        if path.as_os_str().is_empty() {
            return Err(ChatError::config("SQLite file path is required."));
        }
    }

    let uri = config.to_uri()?;
    let display_name = config.display_name();
    info!(target_db = %config.display_string(), "Connecting to database");

    let handle = db::connect(&uri).await.map_err(into_connection_error)?;

    match handle.list_tables().await {
        Ok(tables) => {
            debug!(table_count = tables.len(), "Connection probe succeeded");
            Ok((handle, display_name))
        }
        Err(e) => {
            warn!(error = %e, "Connection probe failed");
            if let Err(close_err) = handle.close().await {
                debug!(error = %close_err, "Failed to close rejected handle");
            }
            Err(into_connection_error(e))
        }
    }
}

/// Normalizes failures raised while staging or opening a database.
///
/// Database failures keep the library message; anything unexpected is
/// wrapped so the user still sees a connection error.
pub fn into_connection_error(error: ChatError) -> ChatError {
    match error {
        ChatError::Connection(_) | ChatError::Config(_) => error,
        ChatError::Query(msg) => ChatError::Connection(msg),
        other => ChatError::connection(format!("Unexpected error: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_empty_sqlite_path_is_rejected() {
        let config = ConnectionConfig::sqlite(PathBuf::new());
        let err = build(&config).await.err().unwrap();
        assert_eq!(
            err.to_string(),
            "Configuration error: SQLite file path is required."
        );
    }

    #[tokio::test]
    async fn test_missing_sqlite_file_is_connection_error() {
        let dir = TempDir::new().unwrap();
        let config = ConnectionConfig::sqlite(dir.path().join("nope.db"));
        let err = build(&config).await.err().unwrap();
        assert!(matches!(err, ChatError::Connection(_)));
    }

    #[tokio::test]
    async fn test_corrupt_sqlite_file_is_connection_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.db");
        std::fs::write(&path, "not a sqlite database\n".repeat(64)).unwrap();

        let err = build(&ConnectionConfig::sqlite(&path)).await.err().unwrap();
        assert!(matches!(err, ChatError::Connection(_)));
        assert!(err.to_string().contains("not a database"));
    }

    #[test]
    fn test_error_normalization() {
        assert!(matches!(
            into_connection_error(ChatError::query("file is not a database")),
            ChatError::Connection(msg) if msg == "file is not a database"
        ));
        assert!(matches!(
            into_connection_error(ChatError::config("bad")),
            ChatError::Config(_)
        ));
        assert_eq!(
            into_connection_error(ChatError::internal("boom")).to_string(),
            "DB Connection Error: Unexpected error: Internal error: boom"
        );
    }
}

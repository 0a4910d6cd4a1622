//! Scoped working copies of SQLite files.
//!
//! A SQLite file chosen by the user is never opened in place. Its bytes are
//! written into a fresh `temp_*` directory and the session works on that
//! copy. The directory is removed when the [`StagedDatabase`] drops.

use crate::config::ConnectionConfig;
use crate::error::{ChatError, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// File name used when the upload does not carry a usable one.
const FALLBACK_FILE_NAME: &str = "uploaded.db";

/// The contents of a user-supplied SQLite file.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Original base name of the file.
    pub file_name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Reads an upload from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            ChatError::connection(format!("Cannot read {}: {e}", path.display()))
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }
}

/// A staged copy of an upload, deleted on drop.
#[derive(Debug)]
pub struct StagedDatabase {
    // Held for its Drop, which removes the directory and the copy in it.
    dir: TempDir,
    path: PathBuf,
}

impl StagedDatabase {
    /// Writes `upload` into a new `temp_*` directory under `parent`.
    ///
    /// The copy keeps the upload's base name so the database is shown to the
    /// user under the name they chose.
    pub fn stage(upload: &Upload, parent: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("temp_")
            .tempdir_in(parent)
            .map_err(|e| {
                ChatError::internal(format!(
                    "Cannot create staging directory in {}: {e}",
                    parent.display()
                ))
            })?;

        let path = dir.path().join(sanitize_file_name(&upload.file_name));
        std::fs::write(&path, &upload.bytes)
            .map_err(|e| ChatError::internal(format!("Cannot stage {}: {e}", upload.file_name)))?;

        debug!(path = %path.display(), bytes = upload.bytes.len(), "Staged SQLite upload");
        Ok(Self { dir, path })
    }

    /// Path of the staged copy.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the staged copy.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Connection parameters pointing at the staged copy.
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig::sqlite(&self.path)
    }
}

/// Keeps only the final path component of a client-supplied name.
fn sanitize_file_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

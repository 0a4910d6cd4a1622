//! Session-scoped state: the active agent, its database and the transcript.
//!
//! A [`SessionState`] is owned by whichever front end drives it (the TUI or
//! the headless runner) and passed by `&mut` through each request. Nothing
//! here is global.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::agent::{AgentFactory, AgentSession};
use crate::config::ConnectionConfig;
use crate::connection::{self, StagedDatabase, Upload};
use crate::db::DatabaseBackend;
use crate::error::{ChatError, Result};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    Human,
    Ai,
}

/// One message of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

impl Turn {
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Human,
            content: content.into(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Ai,
            content: content.into(),
        }
    }
}

/// Severity of a status banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A status or error line shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub level: BannerLevel,
    pub text: String,
}

impl Banner {
    pub fn new(level: BannerLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(BannerLevel::Success, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(BannerLevel::Info, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(BannerLevel::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(BannerLevel::Error, text)
    }

    /// Error banner for a failed question, always "Agent error: ...".
    pub fn from_ask_error(err: &ChatError) -> Self {
        match err {
            ChatError::Agent(_) => Self::error(err.to_string()),
            other => Self::error(format!("Agent error: {other}")),
        }
    }
}

/// Greeting that opens every fresh transcript.
pub fn greeting(db_name: &str) -> String {
    format!("Hello! I'm connected to {db_name}. How can I help you?")
}

/// An agent bound to an open database.
pub struct ActiveSession {
    // Field order matters: the agent (and its pool) drops before the staged
    // copy it reads from is deleted.
    agent: AgentSession,
    db_name: String,
    staged: Option<StagedDatabase>,
}

impl ActiveSession {
    pub fn agent(&self) -> &AgentSession {
        &self.agent
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    /// The staged working copy, for SQLite sessions.
    pub fn staged(&self) -> Option<&StagedDatabase> {
        self.staged.as_ref()
    }

    async fn close(self) {
        if let Err(e) = self.agent.close().await {
            warn!(error = %e, db = %self.db_name, "Failed to close database handle");
        }
        debug!(db = %self.db_name, "Session closed");
    }
}

/// The state of the one chat session.
pub struct SessionState {
    active: Option<ActiveSession>,
    history: Vec<Turn>,
    staging_dir: PathBuf,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// An unconnected session that stages uploads in the working directory.
    pub fn new() -> Self {
        Self::with_staging_dir(".")
    }

    /// An unconnected session that stages uploads under `dir`.
    pub fn with_staging_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            active: None,
            history: Vec::new(),
            staging_dir: dir.into(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    /// Name of the connected database, if any.
    pub fn db_name(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.db_name.as_str())
    }

    pub fn backend(&self) -> Option<DatabaseBackend> {
        self.active.as_ref().map(|a| a.agent.backend())
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Connects to the database described by `config`.
    ///
    /// On success the previous session is closed and replaced and the
    /// transcript restarts with a greeting. On failure the state is left
    /// untouched. The outcome is reported as a banner rather than an error.
    pub async fn connect(&mut self, config: &ConnectionConfig, factory: &AgentFactory) -> Banner {
        if let Err(e) = config.validate() {
            let text = match e {
                ChatError::Config(msg) => msg,
                other => other.to_string(),
            };
            return match config.backend() {
                DatabaseBackend::MySql => Banner::warning(text),
                DatabaseBackend::Sqlite => Banner::error(text),
            };
        }

        match self.open(config, factory).await {
            Ok(next) => {
                if let Some(previous) = self.active.take() {
                    previous.close().await;
                }
                let db_name = next.db_name.clone();
                self.history = vec![Turn::ai(greeting(&db_name))];
                self.active = Some(next);
                info!(db = %db_name, "Connected");
                Banner::success(format!("Connected to {db_name}!"))
            }
            Err(e) => {
                warn!(error = %e, target_db = %config.display_string(), "Connection failed");
                Banner::error(e.to_string())
            }
        }
    }

    async fn open(&self, config: &ConnectionConfig, factory: &AgentFactory) -> Result<ActiveSession> {
        let (staged, target) = match config {
            ConnectionConfig::Sqlite { path } => {
                let staged = Upload::from_path(path)
                    .and_then(|upload| StagedDatabase::stage(&upload, &self.staging_dir))
                    .map_err(connection::into_connection_error)?;
                let target = staged.connection_config();
                (Some(staged), target)
            }
            ConnectionConfig::MySql { .. } => (None, config.clone()),
        };

        let (handle, db_name) = connection::build(&target).await?;
        let agent = factory.create(handle)?;

        Ok(ActiveSession {
            agent,
            db_name,
            staged,
        })
    }

    /// Asks the connected agent `question`.
    ///
    /// The Human turn is recorded before the agent runs and stays even when
    /// the agent fails; the AI turn is appended only on success.
    pub async fn ask(&mut self, question: &str) -> Result<String> {
        let active = self.active.as_ref().ok_or(ChatError::NotConnected)?;

        let prior = self.history.len();
        self.history.push(Turn::human(question));

        let answer = active
            .agent
            .invoke(&self.history[..prior], question)
            .await?;
        self.history.push(Turn::ai(answer.clone()));
        Ok(answer)
    }

    /// Closes the active session, if any, and clears the transcript.
    pub async fn close(&mut self) {
        if let Some(active) = self.active.take() {
            active.close().await;
        }
        self.history.clear();
    }
}

//! Error types for sqlchat.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for sqlchat operations.
#[derive(Error, Debug)]
pub enum ChatError {
    /// Missing or invalid connection fields, unreadable config files, etc.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection errors (file unreadable, host unreachable, auth failed, etc.)
    #[error("DB Connection Error: {0}")]
    Connection(String),

    /// Query execution errors (syntax errors, unknown tables, timeouts, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// LLM API errors (missing key, rate limits, malformed responses, etc.)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Agent loop failures that the agent could not recover from on its own.
    #[error("Agent error: {0}")]
    Agent(String),

    /// A question was asked before any database was connected.
    #[error("Not connected: please connect to a database first")]
    NotConnected,

    /// Internal application errors (terminal setup, I/O, unexpected states, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChatError {
    // Constructors take anything string-like.

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    pub fn agent(msg: impl Into<String>) -> Self {
        Self::Agent(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Short label printed before fatal startup errors.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration Error",
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Llm(_) => "LLM Error",
            Self::Agent(_) => "Agent Error",
            Self::NotConnected => "Not Connected",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns true for failures raised while answering a question.
    ///
    /// These are the errors the conversation loop lets escape to the UI.
    pub fn is_invocation_error(&self) -> bool {
        matches!(self, Self::Llm(_) | Self::Agent(_))
    }
}

/// Result type alias using ChatError.
pub type Result<T> = std::result::Result<T, ChatError>;

//! The SQL agent: an LLM bound to one database handle through a toolkit of
//! four tools, driven by a tool-calling loop.

pub mod executor;
pub mod factory;
pub mod prompt;
pub mod toolkit;

pub use executor::{AgentExecutor, ExecutorSettings, ITERATION_LIMIT_ANSWER};
pub use factory::AgentFactory;
pub use toolkit::{SqlToolkit, ToolError};

use crate::db::DatabaseBackend;
use crate::error::Result;
use crate::session::Turn;
use tracing::debug;

/// One database handle bound to one LLM-backed agent.
///
/// Created once per successful connection and replaced wholesale on
/// reconnection.
pub struct AgentSession {
    toolkit: SqlToolkit,
    executor: AgentExecutor,
    prefix: String,
}

impl AgentSession {
    pub(crate) fn new(toolkit: SqlToolkit, executor: AgentExecutor, prefix: String) -> Self {
        Self {
            toolkit,
            executor,
            prefix,
        }
    }

    /// Answers `input` with `history` as prior conversation context.
    pub async fn invoke(&self, history: &[Turn], input: &str) -> Result<String> {
        debug!(history_len = history.len(), input_len = input.len(), "Invoking agent");
        let messages = prompt::build_messages(&self.prefix, history, input);
        self.executor.run(&self.toolkit, messages).await
    }

    /// Backend of the bound database.
    pub fn backend(&self) -> DatabaseBackend {
        self.toolkit.backend()
    }

    /// The instructional prefix sent as the system message.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Closes the database handle.
    pub async fn close(&self) -> Result<()> {
        self.toolkit.close().await
    }
}

//! Builds agent sessions for freshly opened database handles.

use std::sync::Arc;

use tracing::debug;

use super::executor::{AgentExecutor, ExecutorSettings};
use super::{prompt, AgentSession, SqlToolkit};
use crate::config::AgentConfig;
use crate::db::DatabaseClient;
use crate::error::Result;
use crate::llm::{create_client, LlmClient, LlmSettings};

enum LlmSource {
    Settings(LlmSettings),
    Shared(Arc<dyn LlmClient>),
}

/// Creates an [`AgentSession`] per database handle.
pub struct AgentFactory {
    llm: LlmSource,
    config: AgentConfig,
}

impl AgentFactory {
    /// A factory that builds a new LLM client for every agent.
    pub fn new(settings: LlmSettings, config: AgentConfig) -> Self {
        Self {
            llm: LlmSource::Settings(settings),
            config,
        }
    }

    /// A factory whose agents all share `llm`.
    pub fn with_llm(llm: Arc<dyn LlmClient>, config: AgentConfig) -> Self {
        Self {
            llm: LlmSource::Shared(llm),
            config,
        }
    }

    /// Agent tuning used for new sessions.
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Binds `handle` to an LLM client and the SQL toolkit.
    pub fn create(&self, handle: Box<dyn DatabaseClient>) -> Result<AgentSession> {
        let llm = match &self.llm {
            LlmSource::Settings(settings) => create_client(settings)?,
            LlmSource::Shared(llm) => Arc::clone(llm),
        };

        let backend = handle.backend();
        let prefix = prompt::build_prefix(backend, self.config.top_k);
        debug!(backend = %backend, "Creating SQL agent");

        let toolkit = SqlToolkit::new(handle, Arc::clone(&llm), &self.config);
        let executor = AgentExecutor::new(
            llm,
            ExecutorSettings {
                max_iterations: self.config.max_iterations,
                handle_parsing_errors: self.config.handle_parsing_errors,
            },
        );

        Ok(AgentSession::new(toolkit, executor, prefix))
    }
}

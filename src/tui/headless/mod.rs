//! Headless mode for scripting and automated testing.
//!
//! Connects once, asks a list of questions in order, and prints the
//! resulting transcript instead of drawing the terminal UI.

mod output;

pub use output::HeadlessOutput;

use crate::agent::AgentFactory;
use crate::cli::{Cli, OutputFormat};
use crate::config::ConnectionConfig;
use crate::error::{ChatError, Result};
use crate::session::{Banner, SessionState, Turn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Configuration for headless mode execution.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Questions to ask, in order.
    pub questions: Vec<String>,
    pub output_format: OutputFormat,
    /// Whether to stop at the first failed question.
    pub fail_fast: bool,
    /// Path to write output (None = stdout).
    pub output_file: Option<PathBuf>,
    /// Where staged SQLite copies are written.
    pub staging_dir: PathBuf,
}

impl HeadlessConfig {
    /// Creates a HeadlessConfig from CLI arguments.
    ///
    /// `--ask` questions come first, then those from `--script`.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        cli.validate_headless().map_err(ChatError::config)?;
        let output_format = cli.parse_output_format().map_err(ChatError::config)?;

        let mut questions = cli.ask.clone();
        if let Some(script) = &cli.script {
            questions.extend(parse_questions(&load_script(script)?));
        }

        Ok(Self {
            questions,
            output_format,
            fail_fast: cli.fail_fast,
            output_file: cli.output_file.clone(),
            staging_dir: PathBuf::from("."),
        })
    }
}

/// Reads a question script from a file, or stdin for `-`.
fn load_script(path: &str) -> Result<String> {
    if path == "-" {
        use std::io::Read;
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| ChatError::internal(format!("Failed to read stdin: {e}")))?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(Path::new(path))
            .map_err(|e| ChatError::config(format!("Failed to read script file {path}: {e}")))
    }
}

/// One question per line. Blank lines and `#` comments are skipped.
pub fn parse_questions(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Result of headless execution.
#[derive(Debug, Clone)]
pub struct HeadlessResult {
    pub connected: bool,
    pub db_name: Option<String>,
    /// Connection outcome followed by one banner per failed question.
    pub banners: Vec<Banner>,
    pub turns: Vec<Turn>,
    pub questions_failed: usize,
    pub duration: Duration,
}

impl HeadlessResult {
    /// Process exit code: 1 when connecting or any question failed.
    pub fn exit_code(&self) -> i32 {
        if !self.connected || self.questions_failed > 0 {
            1
        } else {
            0
        }
    }
}

/// Drives a session without a terminal.
pub struct HeadlessRunner {
    config: HeadlessConfig,
    session: SessionState,
}

impl HeadlessRunner {
    pub fn new(config: HeadlessConfig) -> Self {
        let session = SessionState::with_staging_dir(config.staging_dir.clone());
        Self { config, session }
    }

    /// Connects with `connection` and asks every configured question.
    pub async fn run(mut self, connection: &ConnectionConfig, factory: &AgentFactory) -> HeadlessResult {
        let start_time = Instant::now();
        let mut banners = Vec::new();
        let mut questions_failed = 0;

        let banner = self.session.connect(connection, factory).await;
        info!(level = ?banner.level, text = %banner.text, "Headless connect");
        banners.push(banner);

        if self.session.is_connected() {
            for question in &self.config.questions {
                if let Err(e) = self.session.ask(question).await {
                    if e.is_invocation_error() {
                        warn!(error = %e, question = %question, "Headless question failed");
                    } else {
                        error!(error = %e, question = %question, "Unexpected failure asking question");
                    }
                    banners.push(Banner::from_ask_error(&e));
                    questions_failed += 1;
                    if self.config.fail_fast {
                        break;
                    }
                }
            }
        }

        let result = HeadlessResult {
            connected: self.session.is_connected(),
            db_name: self.session.db_name().map(str::to_string),
            banners,
            turns: self.session.history().to_vec(),
            questions_failed,
            duration: start_time.elapsed(),
        };

        self.session.close().await;
        result
    }
}

/// Runs headless mode from CLI arguments. Returns the process exit code.
pub async fn run_headless(
    cli: &Cli,
    factory: &AgentFactory,
    connection: Option<&ConnectionConfig>,
) -> Result<i32> {
    let config = HeadlessConfig::from_cli(cli)?;
    let connection = connection.ok_or_else(|| {
        ChatError::config(
            "--headless requires a connection (URI, --sqlite, --mysql-*, or -c NAME)",
        )
    })?;

    let output = HeadlessOutput::new(config.output_format);
    let output_file = config.output_file.clone();

    let result = HeadlessRunner::new(config).run(connection, factory).await;
    let output_str = output.format(&result);

    if let Some(path) = output_file {
        std::fs::write(&path, &output_str)
            .map_err(|e| ChatError::internal(format!("Failed to write output file: {e}")))?;
    } else {
        print!("{output_str}");
    }

    Ok(result.exit_code())
}

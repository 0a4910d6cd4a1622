//! sqlchat - chat with your SQL database.

use anyhow::Context;
use sqlchat::agent::AgentFactory;
use sqlchat::cli::Cli;
use sqlchat::config::{Config, ConnectionConfig};
use sqlchat::error::ChatError;
use sqlchat::llm::LlmSettings;
use sqlchat::{logging, tui};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();

    logging::init(logging::LogSink::for_mode(cli.is_headless()));

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            let category = e
                .downcast_ref::<ChatError>()
                .map(ChatError::category)
                .unwrap_or("Error");
            error!("{category}: {e:#}");
            eprintln!("{category}: {e:#}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;

    if let Some(provider) = &cli.llm {
        config.llm.provider = provider.clone();
    }

    let mut settings = LlmSettings::from_config(&config.llm)?;
    if let Some(model) = &cli.model {
        settings.model = model.clone();
    }
    if settings.api_key.is_none() {
        if let Some(var) = settings.provider.api_key_env() {
            warn!("{var} is not set; questions will fail until it is");
        }
    }
    info!(provider = %settings.provider, model = %settings.model, "LLM configured");

    let connection = resolve_connection(&cli, &config)?;
    if let Some(conn) = &connection {
        info!("Connection: {}", conn.display_string());
    }

    let factory = AgentFactory::new(settings, config.agent.clone());

    if cli.is_headless() {
        let code = tui::headless::run_headless(&cli, &factory, connection.as_ref())
            .await
            .context("headless run failed")?;
        return Ok(code);
    }

    tui::run(factory, connection).await?;
    Ok(0)
}

/// Resolves the initial connection from CLI args, config file, and environment.
///
/// Precedence: CLI arguments, then the named connection, then the config's
/// `default` connection. Environment defaults fill MySQL gaps last.
fn resolve_connection(cli: &Cli, config: &Config) -> sqlchat::error::Result<Option<ConnectionConfig>> {
    let mut connection = cli.to_connection_config()?;

    if connection.is_none() {
        if let Some(name) = cli.connection_name() {
            let named = config.get_connection(Some(name)).ok_or_else(|| {
                ChatError::config(format!("Connection '{name}' not found in config"))
            })?;
            connection = Some(named.clone());
        }
    }

    if connection.is_none() {
        connection = config.get_connection(None).cloned();
    }

    if let Some(ref mut conn) = connection {
        conn.apply_env_defaults();
    }

    Ok(connection)
}

//! agentdesk CLI Entry Point
//!
//! Subcommands:
//! - `serve` - Run the REST API (default when no subcommand is given)
//! - `ping` - Check the configured database once and print a JSON envelope
//! - `openapi` - Print the OpenAPI document
//!
//! `ping` and `openapi` write JSON to stdout. Logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::json;

use agentdesk::config::Settings;
use agentdesk::engine::{execute_once, ConnectionProvider, DatabaseType};
use agentdesk::output::{ErrorEnvelope, Metadata, SuccessEnvelope};
use agentdesk::{api, init_logging, server, DeskError};

/// agentdesk - REST API over the agents sample database
#[derive(Parser)]
#[command(name = "agentdesk")]
#[command(about = "CRUD REST API over agents, customers, orders and related tables")]
#[command(version)]
struct Cli {
    /// Config file to use instead of the discovered one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Listen port (overrides PORT and the config file)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Verify the database is reachable
    Ping,

    /// Print the OpenAPI document
    Openapi,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "agentdesk failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    if let Some(Commands::Openapi) = cli.command {
        println!("{}", serde_json::to_string_pretty(api::docs::openapi())?);
        return Ok(ExitCode::SUCCESS);
    }

    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    init_logging(&settings.log);

    match cli.command {
        Some(Commands::Ping) => Ok(ping(&settings).await),
        Some(Commands::Serve { port }) => {
            if let Some(port) = port {
                settings.port = port;
            }
            serve(&settings).await?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            serve(&settings).await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Openapi) => Ok(ExitCode::SUCCESS),
    }
}

async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let connection = settings.database.resolve()?;
    let pool = settings.database.pool;

    match connection.engine {
        #[cfg(feature = "mysql")]
        DatabaseType::MySQL => {
            let provider = agentdesk::engine::mysql::MySqlProvider::new(&connection, pool)?;
            server::serve(provider, settings.port).await?;
        }
        #[cfg(feature = "sqlite")]
        DatabaseType::SQLite => {
            let provider = agentdesk::engine::sqlite::SqliteProvider::new(&connection, pool)?;
            server::serve(provider, settings.port).await?;
        }
        #[allow(unreachable_patterns)]
        other => bail!("Engine {other} is not compiled into this build"),
    }

    Ok(())
}

/// Print a success or error envelope; never panics on a bad database
async fn ping(settings: &Settings) -> ExitCode {
    let start = Instant::now();
    let engine = settings.database.connection.engine;

    let outcome = match settings.database.resolve() {
        Ok(connection) => ping_engine(&connection, settings).await,
        Err(e) => Err(e),
    };

    let (json, code) = match outcome {
        Ok(data) => {
            let meta = Metadata::new(u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX));
            let envelope = SuccessEnvelope::new(engine.as_str(), "ping", data, meta);
            (serde_json::to_string(&envelope), ExitCode::SUCCESS)
        }
        Err(e) => {
            let envelope = ErrorEnvelope::from_error(engine.as_str(), "ping", &e);
            (serde_json::to_string(&envelope), ExitCode::FAILURE)
        }
    };

    match json {
        Ok(json) => {
            println!("{json}");
            code
        }
        Err(e) => {
            eprintln!("Error: failed to serialize ping result: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn ping_engine(
    connection: &agentdesk::ConnectionConfig,
    settings: &Settings,
) -> agentdesk::Result<serde_json::Value> {
    let pool = settings.database.pool;

    match connection.engine {
        #[cfg(feature = "mysql")]
        DatabaseType::MySQL => {
            let provider = agentdesk::engine::mysql::MySqlProvider::new(connection, pool)?;
            let result = async {
                let (version, server) = provider.server_version().await?;
                let mut data = probe(&provider).await?;
                data["version"] = json!(version);
                data["server"] = json!(server);
                Ok::<_, DeskError>(data)
            }
            .await;
            provider.close().await;
            result
        }
        #[cfg(feature = "sqlite")]
        DatabaseType::SQLite => {
            let provider = agentdesk::engine::sqlite::SqliteProvider::new(connection, pool)?;
            let result = probe(&provider).await;
            provider.close().await;
            result
        }
        #[allow(unreachable_patterns)]
        other => Err(DeskError::config_error(format!(
            "Engine {other} is not compiled into this build"
        ))),
    }
}

async fn probe<P: ConnectionProvider>(provider: &P) -> agentdesk::Result<serde_json::Value> {
    execute_once(provider, &api::statements::probe()).await?;
    Ok(json!({ "reachable": true, "pool": provider.status() }))
}

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::config::load_config;
use crate::log_store::LogStore;
use crate::log_store_sled::SledLogStore;
use crate::web::{build_router, AppState, Role};

/// Top-level CLI interface
#[derive(Parser)]
#[command(
    name = "log_service",
    version,
    about = "Log ingestion and retrieval service"
)]
pub struct Cli {
    /// TOML configuration file (defaults to log_service.toml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Host/IP to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to bind
        #[arg(long, default_value_t = 8080)]
        port: u16,
        /// Handlers to expose
        #[arg(long, value_enum, default_value_t = Role::All)]
        role: Role,
    },

    /// Ingest a single record into the configured store
    Ingest {
        #[arg(short, long)]
        severity: String,
        #[arg(short, long)]
        message: String,
    },

    /// Print the most recent records as JSON
    Recent,
}

/// Loads configuration, opens the store once and dispatches the command.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref()).context("failed to load configuration")?;

    let store: Arc<dyn LogStore> = Arc::new(
        SledLogStore::open(&config.data_dir, &config.table_name, &config.index_name)
            .with_context(|| format!("failed to open store at {}", config.data_dir))?,
    );
    let state = AppState::new(&config, store);

    match cli.command {
        Commands::Serve { host, port, role } => serve(state, &host, port, role).await,
        Commands::Ingest { severity, message } => {
            let body = serde_json::to_vec(&serde_json::json!({
                "severity": severity,
                "message": message,
            }))?;
            let record = state.ingest.handle(&body)?;
            println!("{}", record.id);
            Ok(())
        }
        Commands::Recent => {
            let records = state.read_recent.handle()?;
            println!("{}", serde_json::to_string_pretty(&records)?);
            Ok(())
        }
    }
}

async fn serve(state: AppState, host: &str, port: u16, role: Role) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, ?role, "log service listening");
    axum::serve(listener, build_router(state, role))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("log service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_defaults_to_all_handlers() {
        let cli = Cli::try_parse_from(["log_service", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { host, port, role } => {
                assert_eq!(host, "0.0.0.0");
                assert_eq!(port, 8080);
                assert_eq!(role, Role::All);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn serve_accepts_a_single_role() {
        let cli = Cli::try_parse_from([
            "log_service",
            "--config",
            "prod.toml",
            "serve",
            "--role",
            "read-recent",
        ])
        .unwrap();

        assert_eq!(cli.config.as_deref(), Some("prod.toml"));
        assert!(matches!(cli.command, Commands::Serve { role: Role::ReadRecent, .. }));
    }
}

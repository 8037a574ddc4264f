//! CCBank - banking backend
//!
//! # Usage
//! ```bash
//! ccbank init                  # create the SQLite file and run migrations
//! ccbank init --force          # drop the existing file first
//! ccbank status                # record counts
//! ccbank serve                 # start the REST API
//! ccbank --log-level debug serve
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ccbank_persistence::Database;
use ccbank_server::{create_router, AppState, ServerConfig};

mod db;

/// CCBank - REST banking backend on SQLite
#[derive(Parser)]
#[command(name = "ccbank")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Database URL (overrides CCBANK_DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,

    /// Initialize database with schema
    Init {
        /// Force re-initialization (drops existing data)
        #[arg(long)]
        force: bool,
    },

    /// Show database status
    Status,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_logging(&cli.log_level);

    let mut config = ServerConfig::from_env().context("Invalid configuration")?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }

    match cli.command {
        Commands::Init { force } => db::init_database(&config.database_url, force).await?,
        Commands::Status => db::show_status(&config.database_url).await?,
        Commands::Serve => serve(config).await?,
    }

    Ok(())
}

async fn serve(config: ServerConfig) -> Result<()> {
    tracing::info!("CCBank v{}", env!("CARGO_PKG_VERSION"));

    db::ensure_parent_dir(&config.database_url)?;
    let db = Database::init(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;

    let state = AppState::from_config(&config, &db).context("Invalid configuration")?;
    let app = create_router(state, &config.cors_allow_origins);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;

    tracing::info!(
        addr = %config.listen_addr,
        withdrawal_stages = config.withdrawal_stages,
        any_origin = config.allows_any_origin(),
        "CCBank server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db.close().await;
    tracing::info!("CCBank server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

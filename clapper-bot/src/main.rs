//! clapper-bot - movie night bot service
//!
//! Resolves configuration, opens the database, wires the movie catalog
//! client and the chat output sink into the command router, and serves the
//! interaction endpoint until Ctrl+C or SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clapper_bot::metadata::TmdbClient;
use clapper_bot::router::Services;
use clapper_bot::sink::ChatApiSink;
use clapper_bot::{build_router, AppState};
use clapper_common::config::{load_toml_config, BotConfig, ConfigOverrides};
use clapper_common::db::init_database;

/// Command-line arguments for clapper-bot
///
/// Every setting may also come from a `CLAPPER_*` environment variable or
/// the config file; the command line wins.
#[derive(Parser, Debug)]
#[command(name = "clapper-bot")]
#[command(about = "Crowd-sourced movie night bot")]
#[command(version)]
struct Args {
    /// Config file (default: ~/.config/clapper/config.toml, then /etc/clapper/config.toml)
    #[arg(short, long, env = "CLAPPER_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long)]
    database: Option<PathBuf>,

    /// Address for the interaction endpoint
    #[arg(short, long)]
    bind: Option<String>,

    /// Chat platform bot token
    #[arg(long)]
    bot_token: Option<String>,

    /// Chat platform REST API base URL
    #[arg(long)]
    chat_api_base: Option<String>,

    /// TMDB API key
    #[arg(long)]
    tmdb_api_key: Option<String>,

    /// TMDB API base URL
    #[arg(long)]
    tmdb_api_base: Option<String>,

    /// TMDB poster image base URL
    #[arg(long)]
    tmdb_image_base: Option<String>,

    /// Timeout for outbound HTTP calls, in seconds
    #[arg(long)]
    http_timeout_secs: Option<u64>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            database_path: self.database.clone(),
            bind_address: self.bind.clone(),
            bot_token: self.bot_token.clone(),
            chat_api_base: self.chat_api_base.clone(),
            tmdb_api_key: self.tmdb_api_key.clone(),
            tmdb_api_base: self.tmdb_api_base.clone(),
            tmdb_image_base: self.tmdb_image_base.clone(),
            http_timeout_secs: self.http_timeout_secs,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clapper_bot=info,clapper_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before any slow startup step
    info!(
        "Starting clapper-bot v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let file_config =
        load_toml_config(args.config.as_deref()).context("Failed to load config file")?;
    let config =
        BotConfig::resolve(args.overrides(), file_config).context("Invalid configuration")?;

    info!("Database path: {}", config.database_path.display());
    let db = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let lookup = TmdbClient::from_config(&config).context("Failed to create TMDB client")?;
    let sink = ChatApiSink::from_config(&config).context("Failed to create chat API client")?;

    let state = AppState::new(Services {
        db: db.clone(),
        lookup: Arc::new(lookup),
        sink: Arc::new(sink),
    });
    info!(
        "Registered commands: {}",
        state.router.table().names().join(", ")
    );

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    info!("clapper-bot listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

//! dirnotify - Directory-to-Messaging Notification Bridge
//!
//! Reads users, groups and memberships from a corporate directory and
//! delivers notifications to the matching chat accounts, exposing the
//! dispatcher over a small JSON API.

use anyhow::Result;
use clap::Parser;
use dirnotify::{
    cli::Cli,
    config::{Config, DirectoryBackend, MessagingBackend},
    core::{DirectoryProvider, MessagingProvider},
    directory::{DemoDirectory, GraphDirectory},
    dispatch::NotificationDispatcher,
    messaging::{DemoMessaging, SlackMessaging},
    server::{ApiServer, AppState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment,
    // and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        // Exit if configuration fails, as it's a critical step.
        std::process::exit(1);
    });

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("dirnotify starting up...");

    // Log the loaded configuration settings for visibility
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Bind Address: {}", config.server.bind);
    info!("Directory Backend: {:?}", config.directory.backend);
    info!("Directory Base URL: {}", config.directory.base_url);
    info!("Directory Timeout: {}s", config.directory.timeout_seconds);
    info!("Messaging Backend: {:?}", config.messaging.backend);
    info!("Messaging Base URL: {}", config.messaging.base_url);
    info!("Messaging Timeout: {}s", config.messaging.timeout_seconds);
    info!("-------------------------------------------------------");

    // =========================================================================
    // 1. Instantiate Providers
    // =========================================================================
    let directory: Arc<dyn DirectoryProvider> = match config.directory.backend {
        DirectoryBackend::Graph => {
            if config.directory.access_token.is_empty() {
                anyhow::bail!("directory.access_token is required for the graph backend");
            }
            Arc::new(GraphDirectory::new(&config.directory)?)
        }
        DirectoryBackend::Demo => {
            info!("Directory backend: canned demo data");
            Arc::new(DemoDirectory::new())
        }
    };
    let messaging: Arc<dyn MessagingProvider> = match config.messaging.backend {
        MessagingBackend::Slack => {
            if config.messaging.bot_token.is_empty() {
                anyhow::bail!("messaging.bot_token is required for the slack backend");
            }
            Arc::new(SlackMessaging::new(&config.messaging)?)
        }
        MessagingBackend::Demo => {
            info!("Messaging backend: canned demo data");
            Arc::new(DemoMessaging::new())
        }
    };

    let mode = match (&config.directory.backend, &config.messaging.backend) {
        (DirectoryBackend::Demo, MessagingBackend::Demo) => "demo",
        (DirectoryBackend::Graph, MessagingBackend::Slack) => "live",
        _ => "mixed",
    };

    let dispatcher = Arc::new(NotificationDispatcher::new(
        Arc::clone(&directory),
        Arc::clone(&messaging),
    ));

    // =========================================================================
    // 2. Start the API Server
    // =========================================================================
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let listener = TcpListener::bind(&config.server.bind).await?;
    info!("API server listening on {}", listener.local_addr()?);
    let server = ApiServer::new(
        listener,
        AppState {
            dispatcher,
            directory,
            messaging,
            mode: mode.to_string(),
        },
        shutdown_rx,
    );
    let server_task = tokio::spawn(server.run());

    // =========================================================================
    // 3. Wait for Shutdown Signal
    // =========================================================================
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {}", e);
    }
    info!("Shutdown signal received, stopping API server...");
    let _ = shutdown_tx.send(true);
    let _ = server_task.await;
    info!("dirnotify shut down cleanly.");

    Ok(())
}

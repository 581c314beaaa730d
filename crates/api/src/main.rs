use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use domain::services::NotificationGateway;
use ofb_catalog_api::app::{create_app, AppState};
use ofb_catalog_api::config::{Config, DeliveryMode};
use ofb_catalog_api::middleware::{init_logging, init_metrics};
use ofb_catalog_api::services::{ConsoleGateway, TelegramClient, TelegramGateway, TelegramPoller};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load().context("Failed to load configuration")?;

    init_logging(&config.logging).context("Failed to initialize logging")?;
    init_metrics().context("Failed to initialize metrics")?;

    info!("Starting OFB Catalog API v{}", env!("CARGO_PKG_VERSION"));

    let db_config: persistence::db::DatabaseConfig = (&config.database).into();
    let pool = persistence::db::create_pool(&db_config)
        .await
        .context("Failed to connect to database")?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;
    info!("Migrations completed");

    let telegram_client = if config.telegram.enabled {
        Some(TelegramClient::new(&config.telegram).context("Failed to build Telegram client")?)
    } else {
        None
    };
    let gateway: Arc<dyn NotificationGateway> = match &telegram_client {
        Some(client) => Arc::new(TelegramGateway::new(client.clone())),
        None => {
            info!("Telegram disabled, outbound messages will only be logged");
            Arc::new(ConsoleGateway)
        }
    };

    let addr = config.socket_addr().context("Invalid server address")?;
    let state = AppState::new(config.clone(), pool, gateway)
        .context("Failed to configure admin authentication")?;

    let shutdown = CancellationToken::new();
    let poller = match telegram_client {
        Some(client) if config.telegram.mode == DeliveryMode::Polling => {
            let poller = TelegramPoller::new(
                client,
                state.dispatcher.clone(),
                config.telegram.poll_timeout_secs,
            );
            Some(tokio::spawn(poller.run(shutdown.clone())))
        }
        Some(_) => {
            info!("Telegram webhook mode, expecting updates on /api/telegram/webhook");
            None
        }
        None => None,
    };

    let lifecycle = state.lifecycle.clone();
    let app = create_app(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    if let Some(handle) = poller {
        if let Err(err) = handle.await {
            tracing::warn!(error = %err, "Telegram poller task failed");
        }
    }

    // Sends are individually bounded; the fallback fan-out can chain two.
    let drain = config.notifications.send_timeout() * 2;
    if tokio::time::timeout(drain, lifecycle.flush_notifications())
        .await
        .is_err()
    {
        tracing::warn!("Pending notifications dropped at shutdown");
    }

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM and cancels background tasks.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
    shutdown.cancel();
}

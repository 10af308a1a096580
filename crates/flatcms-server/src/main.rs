//! `FlatCMS` server entry point.
//!
//! Loads configuration, opens the document directory, checks the credentials
//! file, then starts the Axum HTTP server with graceful shutdown. A
//! background worker purges idle sessions and is cancelled on shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info};

use flatcms_server::config::ServerConfig;
use flatcms_server::routes;
use flatcms_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    info!(env = ?config.environment, "FlatCMS starting");

    let state = AppState::from_config(&config).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper_handle = {
        let state = Arc::clone(&state);
        let mut rx = shutdown_rx.clone();
        let interval = Duration::from_secs(config.session_sweep_interval_secs);
        tokio::spawn(async move {
            session_sweeper(state, &mut rx, interval).await;
        })
    };

    let app = routes::build_router(Arc::clone(&state));

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "FlatCMS server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
        .context("server error")?;

    info!("waiting for session sweeper to stop");
    let _ = tokio::time::timeout(Duration::from_secs(5), sweeper_handle).await;

    info!("FlatCMS server stopped");
    Ok(())
}

/// Periodically drop sessions idle for longer than the configured TTL.
async fn session_sweeper(
    state: Arc<AppState>,
    shutdown: &mut watch::Receiver<bool>,
    every: Duration,
) {
    let mut interval = tokio::time::interval(every);
    info!(interval_secs = every.as_secs(), "session sweeper started");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let purged = state.sessions.purge_idle(state.session_ttl).await;
                if purged > 0 {
                    let remaining = state.sessions.len().await;
                    info!(purged, remaining, "idle sessions purged");
                } else {
                    debug!("no idle sessions to purge");
                }
            }
            _ = shutdown.changed() => {
                info!("session sweeper shutting down");
                return;
            }
        }
    }
}

/// Wait for SIGINT or SIGTERM, then broadcast shutdown.
async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
    let _ = shutdown_tx.send(true);
}

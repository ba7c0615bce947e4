//! Startup orchestration.
//!
//! # Responsibilities
//! - Compile and validate the routing table
//! - Start background tasks (metrics, config watcher, reload)
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener starts last, after the table is published

use std::net::SocketAddr;
use std::path::Path;

use tokio::net::TcpListener;

use crate::config::{watcher::ConfigWatcher, ConfigError, ProxyConfig};
use crate::error::RouterError;
use crate::http::HttpServer;
use crate::lifecycle::{reload, signals, Shutdown};
use crate::observability::metrics;
use crate::routing::Router;

/// Errors that abort startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("routing table rejected: {0}")]
    Router(#[from] RouterError),

    #[error("listener error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config watcher error: {0}")]
    Watch(#[from] notify::Error),
}

/// Serve `config` until a termination signal arrives.
///
/// With `watch` set, edits to that file are compiled and swapped in live.
pub async fn serve(config: ProxyConfig, watch: Option<&Path>) -> Result<(), StartupError> {
    let shared = Router::from_config(&config)?.into_shared();

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    tokio::spawn(signals::forward_signals(shutdown.clone()));

    // Dropping the watcher handle stops watching, so keep it for the whole run.
    let _watcher = match watch {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            let handle = watcher.run()?;
            tokio::spawn(reload::run(shared.clone(), updates, shutdown.subscribe()));
            Some(handle)
        }
        None => None,
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, shared);
    server.run(listener, shutdown.subscribe()).await?;

    shutdown.trigger();
    tracing::info!("Shutdown complete");
    Ok(())
}

//! Hot reload of the routing table.
//!
//! A new configuration is compiled into a complete new [`Router`] beside the
//! live one. Only a router that compiled and passed the socket collision
//! check is published; otherwise the live router keeps serving.
//!
//! Listener and timeout settings are read once at startup and are not
//! changed by a reload.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::config::ProxyConfig;
use crate::error::RouterResult;
use crate::observability::metrics;
use crate::routing::router::{Router, SharedRouter};

/// Compile `config` and publish it, or leave `shared` untouched on error.
pub fn apply(shared: &SharedRouter, config: &ProxyConfig) -> RouterResult<()> {
    match Router::from_config(config) {
        Ok(router) => {
            shared.store(Arc::new(router));
            metrics::record_reload(true);
            tracing::info!(routes = config.routes.len(), "Routing table reloaded");
            Ok(())
        }
        Err(e) => {
            metrics::record_reload(false);
            tracing::error!(error = %e, "Reload rejected, keeping current routing table");
            Err(e)
        }
    }
}

/// Apply configuration updates until shutdown or until the sender is gone.
pub async fn run(
    shared: SharedRouter,
    mut updates: mpsc::UnboundedReceiver<ProxyConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(config) => {
                    let _ = apply(&shared, &config);
                }
                None => break,
            },
            _ = shutdown.recv() => break,
        }
    }
    tracing::debug!("Reload task stopped");
}

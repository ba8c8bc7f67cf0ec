//! relayd - multi-user line relay server.
//!
//! Clients connect over TCP, claim a unique username, and exchange
//! broadcast chat, private messages, status updates and relayed files.

mod config;
mod error;
mod handlers;
mod network;
mod state;
mod telemetry;

use crate::config::{CliArgs, Config};
use crate::handlers::Router;
use crate::network::{ConnectionSettings, Gateway};
use crate::state::Registry;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse(std::env::args().skip(1));
    let loaded = Config::from_args(&args);

    // Initialize tracing (the log format itself is configurable)
    let format = loaded
        .as_ref()
        .map(|config| config.logging.format)
        .unwrap_or_default();
    telemetry::init(format);

    let mut config = loaded.map_err(|e| {
        error!(path = ?args.config, error = %e, "Failed to load config");
        e
    })?;

    if let Some(raw) = args.invalid_port() {
        warn!(
            port = %raw,
            fallback = config.listen.address.port(),
            "Invalid port argument, using configured port"
        );
    }
    if !args.ignored.is_empty() {
        warn!(args = ?args.ignored, "Ignoring unrecognized arguments");
    }
    config.apply_cli(&args);

    info!(
        address = %config.listen.address,
        max_line_length = config.limits.max_line_length,
        send_queue = config.limits.send_queue,
        handshake_timeout = config.timeouts.handshake,
        "Starting relayd"
    );

    let registry = Arc::new(Registry::new());
    let router = Router::new(registry);

    let gateway = Gateway::bind(
        config.listen.address,
        router,
        ConnectionSettings::from_config(&config),
    )
    .await
    .map_err(|e| {
        error!(error = %format!("{e:#}"), "Failed to start listener");
        e
    })?;
    info!(address = %gateway.local_addr()?, "Accepting connections");

    gateway.run(shutdown_signal()).await
}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

//! Gateway - TCP listener that accepts incoming sessions.
//!
//! The Gateway binds the listen socket and spawns one Connection task per
//! accepted client. Every session token is a child of the Gateway's root
//! token, so cancelling the root closes them all.

use crate::handlers::Router;
use crate::network::{Connection, ConnectionSettings};
use crate::state::SessionIdGenerator;
use crate::telemetry::spans;
use anyhow::Context;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, error, info, instrument};

/// Pause after a failed accept so descriptor exhaustion does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// The Gateway accepts incoming TCP connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    router: Router,
    settings: ConnectionSettings,
    ids: SessionIdGenerator,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl Gateway {
    /// Bind the gateway to the specified address.
    pub async fn bind(
        addr: SocketAddr,
        router: Router,
        settings: ConnectionSettings,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await.with_context(|| {
            format!("failed to bind {addr} (port already in use or permission denied)")
        })?;
        info!(%addr, "Listener bound");

        Ok(Self {
            listener,
            router,
            settings,
            ids: SessionIdGenerator::new(),
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown_signal` resolves, then close every
    /// session and wait for them to finish.
    #[instrument(skip_all, name = "gateway")]
    pub async fn run<F>(self, shutdown_signal: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown_signal);

        loop {
            tokio::select! {
                _ = &mut shutdown_signal => {
                    info!("Shutdown requested");
                    break;
                }
                _ = self.shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => self.spawn_session(stream, addr),
                    Err(e) => {
                        error!(error = %e, "Failed to accept connection");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
            }
        }

        self.shutdown.cancel();
        self.tracker.close();
        info!(sessions = self.tracker.len(), "Waiting for sessions to close");
        self.tracker.wait().await;
        info!("Gateway stopped");
        Ok(())
    }

    fn spawn_session(&self, stream: tokio::net::TcpStream, addr: SocketAddr) {
        let id = self.ids.next();
        info!(%addr, session = %id, "Connection accepted");

        let connection = Connection::new(
            id,
            stream,
            addr,
            self.router.clone(),
            self.settings,
            self.shutdown.child_token(),
        );
        let span = spans::session(&id.to_string(), &addr.to_string());
        self.tracker.spawn(connection.run().instrument(span));
    }
}

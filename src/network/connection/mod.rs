//! Connection - Handles an individual client session.
//!
//! Each Connection runs in its own Tokio task:
//!
//! ```text
//! Phase 1: Handshake (prompt, one username line under a deadline)
//!    ↓
//! Phase 2: Active loop (tokio::select! over reads and cancellation)
//!    ┌──────────────────────────────────────────────────┐
//!    │                Connection Task                   │
//!    │                                                  │
//!    │  ┌──────────────┐              ┌──────────────┐  │
//!    │  │  FramedRead  │              │ Writer Task  │  │
//!    │  └──────┬───────┘              └──────▲───────┘  │
//!    │         ▼                             │ mpsc     │
//!    │     [Router] ──── Registry fan-out ───┘          │
//!    └──────────────────────────────────────────────────┘
//! ```
//!
//! Whatever ends Phase 2, the session drops out of presence, its departure
//! is announced, and only then is the username released. The writer is
//! given a short grace period to flush.

mod error_handling;
mod event_loop;
mod handshake;
mod writer;

use error_handling::{log_handshake_failure, log_read_error};
use event_loop::LoopExit;
use handshake::HandshakeContext;

use crate::config::Config;
use crate::error::SessionError;
use crate::handlers::Router;
use crate::state::{Line, SessionHandle, SessionId, SessionState};
use relay_proto::{LineCodec, ServerLine};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub(super) type LineReader = FramedRead<OwnedReadHalf, LineCodec>;
pub(super) type LineWriter = FramedWrite<OwnedWriteHalf, LineCodec>;

/// How long a closing session's writer may keep flushing.
const WRITER_GRACE: Duration = Duration::from_secs(5);

/// Per-session limits, resolved once from [`Config`].
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub max_line_length: usize,
    pub send_queue: usize,
    pub handshake_timeout: Duration,
}

impl ConnectionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_line_length: config.limits.max_line_length,
            send_queue: config.limits.send_queue,
            handshake_timeout: config.timeouts.handshake(),
        }
    }
}

/// A client connection handler.
pub struct Connection {
    id: SessionId,
    addr: SocketAddr,
    stream: TcpStream,
    router: Router,
    settings: ConnectionSettings,
    shutdown: CancellationToken,
}

impl Connection {
    pub fn new(
        id: SessionId,
        stream: TcpStream,
        addr: SocketAddr,
        router: Router,
        settings: ConnectionSettings,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            id,
            addr,
            stream,
            router,
            settings,
            shutdown,
        }
    }

    /// Drive the session from accept to close.
    pub async fn run(self) {
        let Connection {
            id,
            addr,
            stream,
            router,
            settings,
            shutdown,
        } = self;
        let mut state = SessionState::Connecting;

        let (read_half, write_half) = stream.into_split();
        let codec = LineCodec::with_max_len(settings.max_line_length);
        let mut reader = FramedRead::new(read_half, codec.clone());
        let sink = FramedWrite::new(write_half, codec);

        let (tx, rx) = mpsc::channel::<Line>(settings.send_queue);
        let mut writer = tokio::spawn(writer::drain(sink, rx, shutdown.clone()));
        let handle = SessionHandle::new(id, tx, shutdown.clone());

        advance(&mut state, SessionState::AwaitingUsername);
        send(&handle, &ServerLine::Prompt);

        let negotiated = handshake::negotiate(
            &mut reader,
            HandshakeContext {
                registry: router.registry(),
                handle: &handle,
                timeout: settings.handshake_timeout,
                shutdown: &shutdown,
            },
        )
        .await;

        match negotiated {
            Ok(claim) => {
                advance(&mut state, SessionState::Active);
                let username = claim.name().to_string();
                info!(
                    %addr,
                    username = %username,
                    session = %claim.id(),
                    online = router.registry().len(),
                    "Session active"
                );
                router.announce_join(&username);

                match event_loop::run(&mut reader, &router, &username, &shutdown).await {
                    LoopExit::PeerClosed => debug!("Peer closed connection"),
                    LoopExit::ReadError(e) => log_read_error(&e),
                    LoopExit::Cancelled => debug!("Session cancelled"),
                }

                // Announce while the name is still held so a reconnect under
                // the same name cannot join ahead of this departure.
                claim.retire();
                router.announce_leave(&username);
                claim.release();
                info!(username = %username, "Session left");
            }
            Err(e) => {
                log_handshake_failure(&e);
                if matches!(e, SessionError::UsernameTaken(_)) {
                    send(&handle, &ServerLine::UsernameTaken);
                }
            }
        }

        advance(&mut state, SessionState::Closed);
        drop(handle);
        drop(reader);

        if tokio::time::timeout(WRITER_GRACE, &mut writer).await.is_err() {
            debug!("Writer did not finish in time, aborting");
            writer.abort();
        }
        debug!(%addr, "Connection closed");
    }
}

fn send(handle: &SessionHandle, message: &ServerLine) {
    let line: Line = Arc::from(message.to_string());
    if let Err(e) = handle.deliver(&line) {
        debug!(error = %e, "Failed to queue line for own session");
    }
}

fn advance(state: &mut SessionState, next: SessionState) {
    match state.advance(next) {
        Ok(()) => debug!(state = %next, "Session state changed"),
        Err(e) => warn!(error = %e, "Ignoring session state change"),
    }
}

//! Active-session read loop.
//!
//! Reads lines until the peer goes away or the session is cancelled and
//! hands each one to the Router in arrival order. There is no idle timeout.

use super::LineReader;
use crate::handlers::Router;
use futures_util::StreamExt;
use relay_proto::ProtocolError;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Why the read loop stopped.
#[derive(Debug)]
pub(super) enum LoopExit {
    /// Clean end of stream.
    PeerClosed,
    /// The transport failed or a line broke framing.
    ReadError(ProtocolError),
    /// The session token was cancelled (shutdown, admin disconnect, slow
    /// consumer or write failure).
    Cancelled,
}

pub(super) async fn run(
    reader: &mut LineReader,
    router: &Router,
    username: &str,
    shutdown: &CancellationToken,
) -> LoopExit {
    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return LoopExit::Cancelled,
            next = reader.next() => next,
        };

        match next {
            None => return LoopExit::PeerClosed,
            Some(Err(e)) => return LoopExit::ReadError(e),
            Some(Ok(line)) => {
                let fanout = router.dispatch(username, &line);
                if !fanout.is_clean() {
                    debug!(
                        attempted = fanout.attempted(),
                        failed = fanout.failed.len(),
                        "Partial delivery"
                    );
                }
            }
        }
    }
}

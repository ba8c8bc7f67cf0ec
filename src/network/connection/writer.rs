//! Outbound half of a session.
//!
//! A dedicated task drains the session's queue into the socket so that
//! senders never wait on a slow peer. Lines that are already queued are
//! written in one batch before a single flush.

use super::LineWriter;
use crate::state::Line;
use futures_util::SinkExt;
use relay_proto::ProtocolError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Maximum lines written between flushes.
const MAX_BATCH: usize = 64;

/// Drain `rx` into `sink` until every sender is gone or the session is
/// cancelled. A write failure cancels the session so its reader stops too.
pub(super) async fn drain(
    mut sink: LineWriter,
    mut rx: mpsc::Receiver<Line>,
    shutdown: CancellationToken,
) {
    loop {
        let first = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return,
            line = rx.recv() => match line {
                Some(line) => line,
                None => break,
            },
        };

        let written = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return,
            result = write_batch(&mut sink, first, &mut rx) => result,
        };

        if let Err(e) = written {
            debug!(error = %e, "Write failed, closing session");
            shutdown.cancel();
            return;
        }
    }

    if let Err(e) = SinkExt::<Line>::close(&mut sink).await {
        debug!(error = %e, "Failed to close writer");
    }
}

async fn write_batch(
    sink: &mut LineWriter,
    first: Line,
    rx: &mut mpsc::Receiver<Line>,
) -> Result<(), ProtocolError> {
    sink.feed(first).await?;
    for _ in 1..MAX_BATCH {
        match rx.try_recv() {
            Ok(line) => sink.feed(line).await?,
            Err(_) => break,
        }
    }
    SinkExt::<Line>::flush(sink).await
}

//! Username negotiation.
//!
//! One line, read under a deadline. The name is taken literally; only a
//! blank line is rejected before the Registry is consulted.

use super::LineReader;
use crate::error::SessionError;
use crate::state::{Claim, Registry, SessionHandle};
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Everything the handshake needs from its connection.
pub(super) struct HandshakeContext<'a> {
    pub registry: &'a Arc<Registry>,
    pub handle: &'a SessionHandle,
    pub timeout: Duration,
    pub shutdown: &'a CancellationToken,
}

/// Read the username line and claim it.
///
/// The prompt has already been queued by the caller.
pub(super) async fn negotiate(
    reader: &mut LineReader,
    ctx: HandshakeContext<'_>,
) -> Result<Claim, SessionError> {
    let name = tokio::select! {
        biased;
        _ = ctx.shutdown.cancelled() => return Err(SessionError::Cancelled),
        read = tokio::time::timeout(ctx.timeout, reader.next()) => match read {
            Err(_) => return Err(SessionError::HandshakeTimeout(ctx.timeout)),
            Ok(None) => return Err(SessionError::NoUsername),
            Ok(Some(Err(e))) => return Err(e.into()),
            Ok(Some(Ok(line))) => line,
        },
    };

    if name.trim().is_empty() {
        return Err(SessionError::BlankUsername);
    }

    debug!(username = %name, "Claiming username");
    ctx.registry
        .try_claim(&name, ctx.handle.clone())
        .ok_or(SessionError::UsernameTaken(name))
}

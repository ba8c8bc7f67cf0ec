//! Line-based codec for tokio.
//!
//! Reads and writes newline-terminated lines. On decode a line ends at
//! `\n`, `\r\n` or a lone `\r`; invalid UTF-8 is replaced with U+FFFD
//! rather than rejected, so a misbehaving client cannot wedge its own
//! session.

use bytes::{Buf, BytesMut};
use std::sync::Arc;
use tokio_util::codec::{Decoder, Encoder};

use crate::error;

/// Default maximum line length (64 MiB).
///
/// File payloads travel base64-encoded on a single line, so the limit is
/// far above what chat traffic needs.
pub const DEFAULT_MAX_LINE_LEN: usize = 64 * 1024 * 1024;

/// Line-based codec that handles newline-terminated messages.
#[derive(Debug, Clone)]
pub struct LineCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    /// Maximum line length, terminator included
    max_len: usize,
    /// Last line ended in `\r`; drop a `\n` that arrives next
    skip_lf: bool,
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl LineCodec {
    /// Create a new codec with [`DEFAULT_MAX_LINE_LEN`].
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_LINE_LEN)
    }

    /// Create a new codec with a custom max line length.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
            skip_lf: false,
        }
    }

    /// The configured maximum line length.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    fn write_line(line: &str, dst: &mut BytesMut) {
        dst.reserve(line.len() + 1);
        dst.extend_from_slice(line.as_bytes());
        dst.extend_from_slice(b"\n");
    }

    fn line_from_bytes(raw: &[u8]) -> String {
        String::from_utf8_lossy(raw).into_owned()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = error::ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        // The previous line ended in a bare `\r` at the end of the buffer.
        if self.skip_lf && !src.is_empty() {
            if src[0] == b'\n' {
                src.advance(1);
            }
            self.skip_lf = false;
        }

        // Look for a terminator starting from where we left off
        if let Some(offset) = src[self.next_index..]
            .iter()
            .position(|b| *b == b'\n' || *b == b'\r')
        {
            let end = self.next_index + offset;
            let line = src.split_to(end + 1);
            self.next_index = 0;

            if line[end] == b'\r' {
                match src.first().copied() {
                    Some(b'\n') => src.advance(1),
                    Some(_) => {}
                    None => self.skip_lf = true,
                }
            }

            if line.len() > self.max_len {
                return Err(error::ProtocolError::LineTooLong {
                    actual: line.len(),
                    limit: self.max_len,
                });
            }

            Ok(Some(Self::line_from_bytes(&line[..end])))
        } else {
            // No complete line yet - remember where we stopped
            self.next_index = src.len();

            if src.len() > self.max_len {
                return Err(error::ProtocolError::LineTooLong {
                    actual: src.len(),
                    limit: self.max_len,
                });
            }

            Ok(None)
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            return Ok(None);
        }

        // Peer closed mid-line: hand out what we have, like a line reader would.
        let rest = src.split_to(src.len());
        self.next_index = 0;
        Ok(Some(Self::line_from_bytes(&rest)))
    }
}

impl Encoder<String> for LineCodec {
    type Error = error::ProtocolError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> error::Result<()> {
        Self::write_line(&line, dst);
        Ok(())
    }
}

/// Shared lines, rendered once and queued to many sessions.
impl Encoder<Arc<str>> for LineCodec {
    type Error = error::ProtocolError;

    fn encode(&mut self, line: Arc<str>, dst: &mut BytesMut) -> error::Result<()> {
        Self::write_line(&line, dst);
        Ok(())
    }
}

/// Drain every complete line currently buffered in `buf`.
///
/// Used by tests and the benchmark to exercise the decoder without a socket.
pub fn decode_all(codec: &mut LineCodec, buf: &mut BytesMut) -> error::Result<Vec<String>> {
    let mut lines = Vec::new();
    while buf.has_remaining() {
        match codec.decode(buf)? {
            Some(line) => lines.push(line),
            None => break,
        }
    }
    Ok(lines)
}

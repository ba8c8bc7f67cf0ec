//! Test line client.
//!
//! Speaks the raw line protocol so tests can assert on exact wire text.

use relay_proto::ServerLine;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

pub const PROMPT: &str = "Enter your username:";
pub const TAKEN: &str = "Username already taken. Please try again.";

/// A test client.
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
    name: Option<String>,
}

impl TestClient {
    /// Open a TCP connection without doing the handshake.
    pub async fn connect_raw(address: &str) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(address).await?;

        // Split stream for reading and writing
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
            name: None,
        })
    }

    /// Connect, claim `name`, and wait for our own join and presence lines.
    pub async fn connect(address: &str, name: &str) -> anyhow::Result<Self> {
        let mut client = Self::connect_raw(address).await?;
        client.expect_line(PROMPT).await?;
        client.send_line(name).await?;

        let joined = format!("USER_EVENT::joined::{name}");
        let lines = client.recv_until(|line| line == joined || line == TAKEN).await?;
        if lines.last().map(String::as_str) == Some(TAKEN) {
            anyhow::bail!("username {name:?} was taken");
        }
        client.recv_until(|line| line.starts_with("Online users:")).await?;
        client.name = Some(name.to_string());
        Ok(client)
    }

    #[allow(dead_code)]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Send one line; a `\n` terminator is appended unless present.
    pub async fn send_line(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        if !line.ends_with('\n') {
            self.writer.write_all(b"\n").await?;
        }
        self.writer.flush().await?;
        Ok(())
    }

    /// Shut down the write half; the read half stays open.
    #[allow(dead_code)]
    pub async fn close_write(&mut self) -> anyhow::Result<()> {
        self.writer.flush().await?;
        self.writer.shutdown().await?;
        Ok(())
    }

    /// Receive a single line (terminator stripped).
    pub async fn recv(&mut self) -> anyhow::Result<String> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    /// Receive a line with a timeout. End of stream is an error.
    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<String> {
        let mut line = String::new();
        let n = timeout(dur, self.reader.read_line(&mut line)).await??;
        if n == 0 {
            anyhow::bail!("connection closed");
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Receive and classify a line.
    #[allow(dead_code)]
    pub async fn recv_parsed(&mut self) -> anyhow::Result<ServerLine> {
        let line = self.recv().await?;
        line.parse::<ServerLine>()
            .map_err(|e| anyhow::anyhow!("Parse error: {e}"))
    }

    /// Receive lines until `predicate` matches; the match is the last one.
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> anyhow::Result<Vec<String>>
    where
        F: FnMut(&str) -> bool,
    {
        let mut lines = Vec::new();
        loop {
            let line = self.recv().await?;
            let done = predicate(&line);
            lines.push(line);
            if done {
                break;
            }
        }
        Ok(lines)
    }

    /// Receive the next line and require it to equal `expected`.
    pub async fn expect_line(&mut self, expected: &str) -> anyhow::Result<()> {
        let line = self.recv().await?;
        anyhow::ensure!(line == expected, "expected {expected:?}, got {line:?}");
        Ok(())
    }

    /// Discard whatever arrives until the connection goes quiet.
    #[allow(dead_code)]
    pub async fn drain(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = self.recv_timeout(Duration::from_millis(200)).await {
            lines.push(line);
        }
        lines
    }

    /// Succeed if nothing arrives for `dur`.
    #[allow(dead_code)]
    pub async fn expect_silence(&mut self, dur: Duration) -> anyhow::Result<()> {
        let mut line = String::new();
        match timeout(dur, self.reader.read_line(&mut line)).await {
            Err(_) => Ok(()),
            Ok(Ok(0)) => anyhow::bail!("connection closed"),
            Ok(Ok(_)) => anyhow::bail!("unexpected line {:?}", line.trim_end()),
            Ok(Err(e)) => Err(e.into()),
        }
    }

    /// Succeed once the server closes the connection, failing on any line.
    #[allow(dead_code)]
    pub async fn expect_closed(&mut self, dur: Duration) -> anyhow::Result<()> {
        let mut line = String::new();
        match timeout(dur, self.reader.read_line(&mut line)).await? {
            Ok(0) => Ok(()),
            Ok(_) => anyhow::bail!("unexpected line {:?}", line.trim_end()),
            // A reset also counts as closed.
            Err(_) => Ok(()),
        }
    }
}

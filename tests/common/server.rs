//! Test server management.
//!
//! Spawns and manages relayd instances for integration testing.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::time::sleep;

/// A test server instance.
pub struct TestServer {
    child: Child,
    port: u16,
    _config: Option<NamedTempFile>,
}

impl TestServer {
    /// Path to the relayd binary built for this test run.
    pub fn binary() -> PathBuf {
        PathBuf::from(env!("CARGO_BIN_EXE_relayd"))
    }

    /// Spawn a server listening on `port` with built-in defaults.
    pub async fn spawn(port: u16) -> anyhow::Result<Self> {
        Self::launch(port, &port.to_string(), None).await
    }

    /// Spawn a server on `port` with the given TOML configuration.
    #[allow(dead_code)]
    pub async fn spawn_with_config(port: u16, toml: &str) -> anyhow::Result<Self> {
        Self::launch(port, &port.to_string(), Some(toml)).await
    }

    /// Spawn a server whose port argument is `port_arg` verbatim, e.g. an
    /// unparsable one. `port` is where the server is expected to listen.
    #[allow(dead_code)]
    pub async fn spawn_with_port_arg(
        port: u16,
        port_arg: &str,
        toml: Option<&str>,
    ) -> anyhow::Result<Self> {
        Self::launch(port, port_arg, toml).await
    }

    async fn launch(port: u16, port_arg: &str, toml: Option<&str>) -> anyhow::Result<Self> {
        let config = match toml {
            Some(content) => {
                let mut file = NamedTempFile::new()?;
                file.write_all(content.as_bytes())?;
                file.flush()?;
                Some(file)
            }
            None => None,
        };

        let mut command = Command::new(Self::binary());
        command
            .arg(port_arg)
            .env("RUST_LOG", "warn")
            .stdout(Stdio::null());
        if let Some(file) = &config {
            command.arg("--config").arg(file.path());
        }
        let child = command.spawn()?;

        let server = Self {
            child,
            port,
            _config: config,
        };

        // Wait for server to start listening
        server.wait_until_ready().await?;

        Ok(server)
    }

    /// Wait until the server is accepting connections.
    async fn wait_until_ready(&self) -> anyhow::Result<()> {
        for _ in 0..50 {
            if let Ok(stream) = tokio::net::TcpStream::connect(("127.0.0.1", self.port)).await {
                drop(stream);
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("Server failed to start within 5 seconds")
    }

    /// Get the server address.
    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    #[allow(dead_code)]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Connect and claim `name`, returning once the join is confirmed.
    pub async fn connect(&self, name: &str) -> anyhow::Result<super::client::TestClient> {
        super::client::TestClient::connect(&self.address(), name).await
    }

    /// Connect without sending a username.
    #[allow(dead_code)]
    pub async fn connect_raw(&self) -> anyhow::Result<super::client::TestClient> {
        super::client::TestClient::connect_raw(&self.address()).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Kill the server process
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

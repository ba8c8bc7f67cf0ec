//! relay-client - terminal client for relayd.
//!
//! ```text
//! relay-client [host] [port] [--name <name>] [--downloads <dir>]
//! ```
//!
//! Input lines starting with `/` are commands (`/dm`, `/status`, `/file`,
//! `/quit`); everything else is sent as chat. Files received from other
//! users are saved under the downloads directory.

use anyhow::{Context, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures_util::{SinkExt, StreamExt};
use relay_proto::{DELIMITER, LineCodec, Presence, PresenceEvent, ServerLine, command};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 1234;
const DEFAULT_DOWNLOADS: &str = "downloads";

#[derive(Debug, PartialEq, Eq)]
struct ClientArgs {
    host: String,
    port: u16,
    name: Option<String>,
    downloads: PathBuf,
}

impl ClientArgs {
    fn parse<I, S>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut host = None;
        let mut port = None;
        let mut name = None;
        let mut downloads = PathBuf::from(DEFAULT_DOWNLOADS);
        let mut args = args.into_iter().map(Into::<String>::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-n" | "--name" => name = Some(args.next().context("--name needs a value")?),
                "-d" | "--downloads" => {
                    downloads = PathBuf::from(args.next().context("--downloads needs a value")?)
                }
                _ if arg.starts_with('-') => bail!("unknown option {arg}"),
                _ if host.is_none() => host = Some(arg),
                _ if port.is_none() => {
                    port = Some(arg.parse().with_context(|| format!("invalid port {arg:?}"))?)
                }
                _ => bail!("unexpected argument {arg}"),
            }
        }

        Ok(Self {
            host: host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: port.unwrap_or(DEFAULT_PORT),
            name,
            downloads,
        })
    }
}

/// One line typed by the user.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Chat(&'a str),
    Direct { recipient: &'a str, text: &'a str },
    Status(&'a str),
    File(&'a Path),
    Quit,
    Usage(&'static str),
    Empty,
}

impl<'a> Input<'a> {
    fn parse(line: &'a str) -> Self {
        if line.trim().is_empty() {
            return Input::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Input::Chat(line);
        };

        let (verb, args) = rest.split_once(' ').unwrap_or((rest, ""));
        let args = args.trim();
        match verb {
            "quit" | "q" => Input::Quit,
            "status" => Input::Status(args),
            "dm" | "msg" => match args.split_once(' ') {
                Some((recipient, text)) if !text.trim().is_empty() => Input::Direct {
                    recipient,
                    text: text.trim_start(),
                },
                _ => Input::Usage("/dm <user> <message>"),
            },
            "file" if !args.is_empty() => Input::File(Path::new(args)),
            "file" => Input::Usage("/file <path>"),
            _ => Input::Chat(line),
        }
    }
}

/// Render a presence snapshot as `name (status)` entries.
fn describe_presence(presence: &Presence) -> String {
    if presence.is_empty() {
        return "Online: nobody".to_string();
    }
    let entries: Vec<String> = presence
        .0
        .iter()
        .map(|entry| format!("{} ({})", entry.name, entry.status))
        .collect();
    format!("Online: {}", entries.join(", "))
}

/// Where a received file lands. Only the final path component of the
/// sender's filename is used.
fn download_path(dir: &Path, filename: &str) -> Option<PathBuf> {
    let base = Path::new(filename).file_name()?;
    Some(dir.join(base))
}

async fn save_file(dir: &Path, filename: &str, payload: &str) -> anyhow::Result<PathBuf> {
    let path = download_path(dir, filename)
        .with_context(|| format!("refusing to save file named {filename:?}"))?;
    let bytes = STANDARD
        .decode(payload.trim())
        .context("file payload is not valid base64")?;
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("cannot create {}", dir.display()))?;
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("cannot write {}", path.display()))?;
    Ok(path)
}

async fn file_command(path: &Path) -> anyhow::Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("{} has no usable file name", path.display()))?;
    // Receivers split the body on the first delimiter.
    if filename.contains(DELIMITER) {
        bail!("file name {filename:?} must not contain {DELIMITER:?}");
    }
    Ok(command::file_line(filename, &STANDARD.encode(bytes)))
}

async fn show_server_line(raw: &str, me: &str, downloads: &Path) {
    let line = match raw.parse::<ServerLine>() {
        Ok(line) => line,
        Err(e) => {
            debug!(error = %e, "Unparsed server line");
            println!("{raw}");
            return;
        }
    };

    match &line {
        ServerLine::Presence(presence) => println!("{}", describe_presence(presence)),
        ServerLine::UserEvent { event, name } => match event {
            PresenceEvent::Joined => println!("* {name} joined"),
            PresenceEvent::Left => println!("* {name} left"),
        },
        ServerLine::Private { from, text } => println!("[private] {from}: {text}"),
        ServerLine::Chat { from, text } => println!("{from}: {text}"),
        ServerLine::FileFrom { from, .. } => {
            let Some((filename, payload)) = line.file_parts() else {
                println!("{from} sent a malformed file");
                return;
            };
            if from == me {
                println!("* sent {filename}");
                return;
            }
            match save_file(downloads, filename, payload).await {
                Ok(path) => println!("* {from} sent {filename}, saved to {}", path.display()),
                Err(e) => println!("* {from} sent {filename}, not saved: {e:#}"),
            }
        }
        other => println!("{other}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = ClientArgs::parse(std::env::args().skip(1))?;
    let stream = TcpStream::connect((args.host.as_str(), args.port))
        .await
        .with_context(|| format!("could not connect to {}:{}", args.host, args.port))?;
    let (mut sink, mut server) = Framed::new(stream, LineCodec::new()).split();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    match server.next().await {
        Some(Ok(line)) if line.parse::<ServerLine>().ok() == Some(ServerLine::Prompt) => {}
        Some(Ok(line)) => warn!(line = %line, "Unexpected greeting"),
        Some(Err(e)) => return Err(e).context("connection failed during handshake"),
        None => bail!("server closed the connection"),
    }

    let name = match args.name {
        Some(name) if !name.trim().is_empty() => name,
        _ => loop {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(b"Username: ").await?;
            stdout.flush().await?;
            match stdin.next_line().await? {
                Some(name) if !name.trim().is_empty() => break name,
                Some(_) => continue,
                None => return Ok(()),
            }
        },
    };
    sink.send(name.clone()).await.context("failed to send username")?;

    loop {
        tokio::select! {
            incoming = server.next() => match incoming {
                Some(Ok(line)) => {
                    if line.parse::<ServerLine>().ok() == Some(ServerLine::UsernameTaken) {
                        bail!("username {name:?} is already taken");
                    }
                    show_server_line(&line, &name, &args.downloads).await;
                }
                Some(Err(e)) => return Err(e).context("connection lost"),
                None => {
                    println!("* disconnected");
                    return Ok(());
                }
            },
            typed = stdin.next_line() => {
                let Some(typed) = typed? else {
                    break;
                };
                let outgoing = match Input::parse(&typed) {
                    Input::Empty => continue,
                    Input::Quit => break,
                    Input::Usage(usage) => {
                        println!("usage: {usage}");
                        continue;
                    }
                    Input::Chat(text) => text.to_string(),
                    Input::Status(status) => command::status_line(status),
                    Input::Direct { recipient, text } => command::dm_line(recipient, text),
                    Input::File(path) => match file_command(path).await {
                        Ok(line) => line,
                        Err(e) => {
                            println!("* {e:#}");
                            continue;
                        }
                    },
                };
                sink.send(outgoing).await.context("failed to send")?;
            }
        }
    }

    sink.close().await.ok();
    Ok(())
}

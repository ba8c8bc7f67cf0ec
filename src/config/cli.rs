//! Command-line arguments.
//!
//! `relayd [PORT] [--config <path>]`. Parsing never fails: a bad port is
//! kept as [`PortArg::Invalid`] so `main` can warn once logging is up.

use std::path::PathBuf;

/// The positional port argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortArg {
    Valid(u16),
    Invalid(String),
}

/// Parsed command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub port: Option<PortArg>,
    pub config: Option<PathBuf>,
    /// Arguments we did not understand.
    pub ignored: Vec<String>,
}

impl CliArgs {
    /// Parse arguments (program name already skipped).
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter().map(Into::<String>::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-c" | "--config" => match args.next() {
                    Some(path) => parsed.config = Some(PathBuf::from(path)),
                    None => parsed.ignored.push(arg),
                },
                _ if parsed.port.is_none() && !arg.starts_with('-') => {
                    parsed.port = Some(match arg.parse::<u16>() {
                        Ok(port) => PortArg::Valid(port),
                        Err(_) => PortArg::Invalid(arg),
                    });
                }
                _ => parsed.ignored.push(arg),
            }
        }

        parsed
    }

    /// The rejected port text, if the port argument did not parse.
    pub fn invalid_port(&self) -> Option<&str> {
        match &self.port {
            Some(PortArg::Invalid(raw)) => Some(raw),
            _ => None,
        }
    }
}

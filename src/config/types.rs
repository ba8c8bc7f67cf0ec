//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::cli::{CliArgs, PortArg};
use super::limits::{LimitsConfig, TimeoutsConfig};
use super::listen::ListenConfig;
use super::validation::{ValidationError, validate};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Server configuration.
///
/// Every section is optional; a missing file section falls back to its
/// defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Network listen configuration.
    #[serde(default)]
    pub listen: ListenConfig,
    /// Line and queue limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Handshake timeout.
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Load the file named on the command line, or use defaults.
    pub fn from_args(args: &CliArgs) -> Result<Self, ConfigError> {
        match &args.config {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Apply a valid port argument. Invalid ports leave the configured
    /// address alone; the caller warns about them.
    pub fn apply_cli(&mut self, args: &CliArgs) {
        if let Some(PortArg::Valid(port)) = args.port {
            self.listen.address.set_port(port);
        }
    }
}

impl std::str::FromStr for Config {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(content)?;
        validate(&config).map_err(ConfigError::Invalid)?;
        Ok(config)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration. Filtering itself comes from `RUST_LOG`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_is_all_defaults() {
        let config: Config = "".parse().unwrap();
        assert_eq!(config.listen.address.port(), 1234);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn full_file_parses() {
        let config: Config = r#"
[listen]
address = "127.0.0.1:4000"

[limits]
max_line_length = 4096
send_queue = 16

[timeouts]
handshake = 5

[logging]
format = "json"
"#
        .parse()
        .unwrap();

        assert_eq!(config.listen.address.to_string(), "127.0.0.1:4000");
        assert_eq!(config.limits.max_line_length, 4096);
        assert_eq!(config.limits.send_queue, 16);
        assert_eq!(config.timeouts.handshake, 5);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let err = "[logging]\nformat = \"xml\"".parse::<Config>().unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_file_and_reports_missing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[listen]\naddress = \"127.0.0.1:4100\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.listen.address.port(), 4100);

        let err = Config::load("/nonexistent/relayd.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn cli_port_overrides_file() {
        let mut config: Config = "[listen]\naddress = \"127.0.0.1:4000\"".parse().unwrap();

        config.apply_cli(&CliArgs::parse(["notaport"]));
        assert_eq!(config.listen.address.port(), 4000);

        config.apply_cli(&CliArgs::parse(["5555"]));
        assert_eq!(config.listen.address.to_string(), "127.0.0.1:5555");
    }
}

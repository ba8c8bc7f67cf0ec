//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Top-level [`Config`] and loading
//! - [`listen`]: Listener address
//! - [`limits`]: Line length, send queue and handshake timeout
//! - [`cli`]: Command-line arguments layered on top of the file
//! - [`validation`]: Startup sanity checks

mod cli;
mod defaults;
mod limits;
mod listen;
mod types;
mod validation;

pub use cli::CliArgs;
pub use types::{Config, LogFormat};

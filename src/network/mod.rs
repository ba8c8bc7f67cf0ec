//! Network module.
//!
//! Contains the Gateway (TCP listener) and the per-session Connection.

mod connection;
mod gateway;

pub use connection::{Connection, ConnectionSettings};
pub use gateway::Gateway;

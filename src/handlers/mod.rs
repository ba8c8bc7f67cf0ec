//! Line handlers for Active sessions.
//!
//! The [`Router`] owns every path from an inbound line to outbound
//! deliveries. [`Fanout`] records what each delivery did.

mod fanout;
mod router;

pub use fanout::Fanout;
pub use router::Router;

//! Outbound send primitives used by the broadcast engine.

pub mod port;
pub mod throttled;

pub use port::{Transport, TransportError, TransportResult};

//! Redis Streams transport for the stage pipeline.
//!
//! This crate provides:
//! - One durable stream per stage with a shared consumer group
//! - At-least-once delivery via XREADGROUP/XACK
//! - Retry accounting and a single dead-letter stream
//! - Reclaim of pending messages from crashed consumers

pub mod error;
pub mod transport;

pub use error::{TransportError, TransportResult};
pub use transport::{Delivery, QueueTransport, TransportConfig};

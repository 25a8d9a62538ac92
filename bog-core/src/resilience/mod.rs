//! Resilience patterns for production deployment (§5).
//!
//! - Exponential backoff for retries.
//! - Reconnect-with-backoff + stale-connection detection for a venue's
//!   websocket transport.

pub mod backoff;
pub mod reconnect;

pub use backoff::{BackoffConfig, ExponentialBackoff};
pub use reconnect::{ConnectionState, ResilientConfig, ResilientConnection};

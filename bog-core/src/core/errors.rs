//! Hand-written domain error types.
//!
//! Mirrors the teacher's convention of implementing `Display` and
//! `std::error::Error` directly rather than deriving them: these are plain
//! enums, not `thiserror`, because the call sites convert to `anyhow::Error`
//! at task boundaries via `.context(...)` and never need structured matching
//! outside this crate.

use std::fmt;

/// Errors raised by [`crate::book::OrderBookReplica`] mutation methods.
#[derive(Debug, Clone, PartialEq)]
pub enum BookError {
    /// A price or size field was NaN or infinite.
    NotFinite { field: &'static str, value: f64 },
    /// A price or size field was negative.
    Negative { field: &'static str, value: f64 },
    /// The supplied `seq_id` was less than or equal to the replica's current one.
    StaleSequence { incoming: u64, current: u64 },
}

impl fmt::Display for BookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookError::NotFinite { field, value } => {
                write!(f, "orderbook field `{field}` is not finite: {value}")
            }
            BookError::Negative { field, value } => {
                write!(f, "orderbook field `{field}` is negative: {value}")
            }
            BookError::StaleSequence { incoming, current } => write!(
                f,
                "stale seq_id {incoming} <= current {current}, dropping update"
            ),
        }
    }
}

impl std::error::Error for BookError {}

/// Errors raised by [`crate::oss::OrderStateStore`] lifecycle transitions.
#[derive(Debug, Clone, PartialEq)]
pub enum OssError {
    /// The id was not present in the partition the transition expects as its source.
    NotInPartition {
        id: crate::core::order::ClientOrderId,
        expected: &'static str,
    },
    /// The dispatcher received a channel it never registered a handler for.
    /// Per spec this is a bug, not a silent no-op: callers must fail fast.
    UnregisteredChannel(String),
}

impl fmt::Display for OssError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OssError::NotInPartition { id, expected } => {
                write!(f, "order {id} not found in expected partition `{expected}`")
            }
            OssError::UnregisteredChannel(channel) => {
                write!(f, "unregistered channel `{channel}` — mis-dispatch, this is a bug")
            }
        }
    }
}

impl std::error::Error for OssError {}

/// Errors raised while loading or validating the YAML parameter document (§6).
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    MissingRequired(&'static str),
    InvalidValue { field: &'static str, reason: String },
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(field) => {
                write!(f, "missing required configuration key `{field}`")
            }
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for `{field}`: {reason}")
            }
            ConfigError::Parse(msg) => write!(f, "failed to parse configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_error_display() {
        let err = BookError::StaleSequence {
            incoming: 5,
            current: 10,
        };
        assert!(format!("{err}").contains("stale"));
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::MissingRequired("max_position");
        assert!(format!("{err}").contains("max_position"));
    }
}

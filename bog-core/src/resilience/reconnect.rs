//! Resilient connection wrapper with automatic reconnection (§5: "on a close
//! or error the transport reports reconnect = true; the supervising task
//! retries after a 1s backoff and replays the snapshot").
//!
//! Generic over whatever a venue's transport connect call returns (a
//! websocket handle, a [`crate::venue::WsTransport`] implementation, …) —
//! this crate ships no live venue transport (§6), so the type parameter is
//! exercised only by tests here; a real transport plugs its `connect`
//! closure in directly.

use super::backoff::{BackoffConfig, ExponentialBackoff};
use anyhow::{Context, Result};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Connection state for a resilient connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Reconnecting,
    Failed,
}

#[derive(Debug, Clone)]
pub struct ResilientConfig {
    pub backoff_config: BackoffConfig,
    pub health_check_interval: Duration,
    /// Consider the connection stale after this many empty polls.
    pub stale_threshold: usize,
}

impl Default for ResilientConfig {
    fn default() -> Self {
        Self {
            backoff_config: BackoffConfig::default(),
            health_check_interval: Duration::from_secs(30),
            stale_threshold: 10_000,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReconnectionStats {
    pub reconnection_attempts: u64,
    pub successful_reconnections: u64,
    pub failed_reconnections: u64,
    pub last_reconnection: Option<Instant>,
}

/// Wraps a connect-and-poll pair with reconnect-with-backoff and a stale-
/// connection health check. `connect` is called on first use and again on
/// every reconnect attempt; `T` is whatever the transport's connect call
/// hands back (§5).
pub struct ResilientConnection<T> {
    config: ResilientConfig,
    connection: Option<T>,
    state: ConnectionState,
    backoff: ExponentialBackoff,
    stats: ReconnectionStats,
    last_health_check: Instant,
    empty_polls_since_health_check: usize,
    connection_established_at: Option<Instant>,
    connect: Box<dyn FnMut() -> Result<T> + Send>,
}

impl<T> ResilientConnection<T> {
    /// Build a resilient connection and attempt the initial connect.
    pub fn new(config: ResilientConfig, connect: impl FnMut() -> Result<T> + Send + 'static) -> Result<Self> {
        let backoff = ExponentialBackoff::with_config(config.backoff_config.clone());
        let mut resilient = Self {
            config,
            connection: None,
            state: ConnectionState::Reconnecting,
            backoff,
            stats: ReconnectionStats::default(),
            last_health_check: Instant::now(),
            empty_polls_since_health_check: 0,
            connection_established_at: None,
            connect: Box::new(connect),
        };
        resilient.connect()?;
        Ok(resilient)
    }

    fn connect(&mut self) -> Result<()> {
        self.stats.reconnection_attempts += 1;
        match (self.connect)() {
            Ok(conn) => {
                info!(attempt = self.stats.reconnection_attempts, "connected");
                self.connection = Some(conn);
                self.state = ConnectionState::Connected;
                self.stats.successful_reconnections += 1;
                self.stats.last_reconnection = Some(Instant::now());
                self.connection_established_at = Some(Instant::now());
                self.backoff.reset();
                Ok(())
            }
            Err(e) => {
                error!(attempt = self.stats.reconnection_attempts, error = %e, "connect failed");
                self.state = ConnectionState::Reconnecting;
                self.stats.failed_reconnections += 1;
                Err(e).context("connection attempt failed")
            }
        }
    }

    fn try_reconnect(&mut self) -> Result<()> {
        if !self.backoff.can_retry() {
            error!("max reconnection attempts reached");
            self.state = ConnectionState::Failed;
            return Err(anyhow::anyhow!("max reconnection attempts exceeded"));
        }
        if let Some(delay) = self.backoff.next_delay() {
            debug!(?delay, attempt = self.backoff.attempt_number(), "backing off before reconnect");
            std::thread::sleep(delay);
        }
        self.connect()
    }

    /// Run `poll` against the live connection, reconnecting first if needed.
    /// Returns `None` on a failed/still-reconnecting state or an empty poll.
    pub fn poll<R>(&mut self, poll: impl FnOnce(&mut T) -> Option<R>) -> Option<R> {
        if self.state == ConnectionState::Failed {
            return None;
        }
        if self.state == ConnectionState::Reconnecting {
            if let Err(e) = self.try_reconnect() {
                warn!(error = %e, "reconnect failed");
                return None;
            }
        }
        let conn = self.connection.as_mut()?;
        match poll(conn) {
            Some(value) => {
                self.empty_polls_since_health_check = 0;
                Some(value)
            }
            None => {
                self.empty_polls_since_health_check += 1;
                self.perform_health_check_if_due();
                None
            }
        }
    }

    fn perform_health_check_if_due(&mut self) {
        if self.last_health_check.elapsed() < self.config.health_check_interval {
            return;
        }
        self.last_health_check = Instant::now();
        if self.empty_polls_since_health_check >= self.config.stale_threshold {
            warn!(
                empty_polls = self.empty_polls_since_health_check,
                "connection appears stale, forcing reconnect"
            );
            self.state = ConnectionState::Reconnecting;
            self.connection = None;
        }
        self.empty_polls_since_health_check = 0;
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn reconnection_stats(&self) -> &ReconnectionStats {
        &self.stats
    }

    pub fn connection_uptime(&self) -> Duration {
        self.connection_established_at.map(|t| t.elapsed()).unwrap_or_default()
    }

    pub fn force_reconnect(&mut self) -> Result<()> {
        info!("forcing reconnection");
        self.connection = None;
        self.state = ConnectionState::Reconnecting;
        self.backoff.reset();
        self.try_reconnect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn first_connect_failure_leaves_state_reconnecting() {
        let result = ResilientConnection::<()>::new(ResilientConfig::default(), || {
            Err(anyhow::anyhow!("refused"))
        });
        assert!(result.is_err());
    }

    #[test]
    fn successful_connect_then_poll_returns_value() {
        let mut conn = ResilientConnection::new(ResilientConfig::default(), || Ok(42u32)).unwrap();
        assert!(conn.is_connected());
        let value = conn.poll(|v| Some(*v));
        assert_eq!(value, Some(42));
    }

    #[test]
    fn force_reconnect_reinvokes_connect() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        let mut conn = ResilientConnection::new(ResilientConfig::default(), move || {
            attempts_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        conn.force_reconnect().unwrap();
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn reconnection_stats_default() {
        let stats = ReconnectionStats::default();
        assert_eq!(stats.reconnection_attempts, 0);
        assert_eq!(stats.successful_reconnections, 0);
        assert_eq!(stats.failed_reconnections, 0);
    }
}

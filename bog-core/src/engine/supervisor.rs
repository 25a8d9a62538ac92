//! Per-symbol supervisor (§5, §4.8).
//!
//! Owns the shared per-venue state (`OrderStateStore`, `Position`,
//! `OrderBookReplica`) and the `Arc<AtomicBool>` shutdown flag, and runs the
//! shutdown sequence when asked. The actual UER/QG/PE/OMS task loops are
//! cooperative `tokio::task::JoinHandle`s spawned by the caller onto the
//! symbol's own task set (`tokio::task::LocalSet` — see §5); this type is the
//! piece of state every one of those tasks closes over, generalized from the
//! teacher's single synchronous `Engine::shutdown_signal`/`ctrlc::set_handler`
//! idiom to the async world.
//!
//! Grounded on the teacher's `Arc<AtomicBool>` + `ctrlc::set_handler`
//! shutdown-signal pattern (the teacher's own const-generic `Engine` has
//! since been trimmed, see DESIGN.md), and on `original_source`'s
//! position-flat/`cancelAllOrders` teardown order.

use crate::book::OrderBookReplica;
use crate::core::order::Side;
use crate::core::position::Position;
use crate::oss::store::{EventFlags, OrderStateStore};
use crate::venue::{VenueClient, VenueError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Shared per-symbol state handed to every cooperative task (UER, QG, PE,
/// OMS) spawned for one venue/symbol pair (§5).
pub struct SymbolSupervisor {
    pub symbol: String,
    pub book: Mutex<OrderBookReplica>,
    pub oss: Mutex<OrderStateStore>,
    pub position: Mutex<Position>,
    /// The same `Arc<EventFlags>` the `oss` mutex's `OrderStateStore` holds.
    /// Task loops wait on these directly (`engine::run`) rather than through
    /// the `oss` mutex, so a pending wait never blocks UER/OMS from
    /// acquiring `oss` to mutate the intent maps the flag is gating.
    pub flags: Arc<EventFlags>,
    shutdown: Arc<AtomicBool>,
}

impl SymbolSupervisor {
    pub fn new(symbol: impl Into<String>, depth: usize, now: u64) -> Self {
        let symbol = symbol.into();
        let flags = Arc::new(EventFlags::default());
        Self {
            book: Mutex::new(OrderBookReplica::new(symbol.clone(), depth)),
            oss: Mutex::new(OrderStateStore::with_flags(flags.clone())),
            position: Mutex::new(Position::flat(symbol.clone(), now)),
            symbol,
            flags,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn shutdown_signal(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Install a Ctrl-C handler that flips the shutdown flag. Mirrors the
    /// teacher's `ctrlc::set_handler` call in `Engine::run` — failure to
    /// install is logged, not fatal (shutdown remains reachable via code).
    pub fn install_ctrlc_handler(&self) {
        let shutdown = self.shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            warn!("received shutdown signal");
            shutdown.store(true, Ordering::Release);
        }) {
            warn!(error = %e, "failed to install Ctrl-C handler, shutdown via code only");
        }
    }

    /// §4.8 shutdown sequence: up to three concurrent `cancel_all_orders`
    /// requests, then — if a position remains open — up to three concurrent
    /// reduce-only market closes, each batch awaited together before moving
    /// on. The redundancy is retry cover against a single transient teardown
    /// failure (`original_source/src/exchanges/common/exchange.py:297-327`'s
    /// `for attempt in range(3)` fan-out of identical requests via
    /// `asyncio.gather`), not per-symbol fan-out.
    pub async fn shutdown<V: VenueClient>(&self, venue: &V) -> anyhow::Result<()> {
        self.shutdown.store(true, Ordering::Release);
        info!(symbol = %self.symbol, "running shutdown sequence");

        let (r1, r2, r3) = tokio::join!(
            venue.cancel_all_orders(&self.symbol),
            venue.cancel_all_orders(&self.symbol),
            venue.cancel_all_orders(&self.symbol),
        );
        self.reduce_redundant_attempts([r1, r2, r3], "cancel_all_orders")?;

        let position = self.position.lock().await;
        if !position.is_flat() {
            let side = if position.size > 0.0 { Side::Sell } else { Side::Buy };
            let size = position.size.abs();
            drop(position);
            let (r1, r2, r3) = tokio::join!(
                venue.market_close(&self.symbol, side, size),
                venue.market_close(&self.symbol, side, size),
                venue.market_close(&self.symbol, side, size),
            );
            self.reduce_redundant_attempts([r1, r2, r3], "market_close")?;
        }

        info!(symbol = %self.symbol, "shutdown sequence complete");
        Ok(())
    }

    /// Fold three redundant attempts of the same teardown call into one
    /// outcome: any single success is enough; if all three failed, an auth
    /// failure is fatal (retrying won't fix bad credentials) while pure
    /// transport failures are logged and shutdown continues regardless.
    fn reduce_redundant_attempts(
        &self,
        results: [Result<(), VenueError>; 3],
        op: &str,
    ) -> anyhow::Result<()> {
        let mut any_ok = false;
        let mut auth_failure = None;
        for result in results {
            match result {
                Ok(()) => any_ok = true,
                Err(VenueError::Auth(msg)) => {
                    error!(symbol = %self.symbol, op, error = %msg, "auth failure on a redundant teardown attempt");
                    auth_failure = Some(msg);
                }
                Err(VenueError::Transport(msg)) => {
                    warn!(symbol = %self.symbol, op, error = %msg, "transport error on a redundant teardown attempt");
                }
            }
        }
        if any_ok {
            return Ok(());
        }
        if let Some(msg) = auth_failure {
            return Err(anyhow::anyhow!("{op} failed: {msg}"));
        }
        warn!(symbol = %self.symbol, op, "all three redundant attempts failed, continuing shutdown");
        Ok(())
    }
}

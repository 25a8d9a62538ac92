//! Task-group loops spawned onto a [`SymbolSupervisor`] (§5 control flow).
//!
//! Four loops, matching the diagram in §2:
//! - [`market_data_loop`]: MDH's periodic resync (§4.2) — the only book
//!   feed a venue with no live websocket stream has, so it doubles as the
//!   sole writer for `SimulatedVenueClient`-backed deployments.
//! - [`tick_loop`]: on `generation_interval`, runs QG then OMS's tick-driven
//!   reconciliation (§4.5, §4.7 steps 1-5).
//! - [`position_executor_loop`]: parks on the `position` flag and runs PE's
//!   take-profit/liquidation planning (§4.6).
//! - [`oms_drain_loop`]: parks on `to_create`/`to_amend`/`to_cancel` and
//!   dispatches the venue client's batch endpoints (§4.7 monitored drain).
//!
//! Grounded on `original_source`'s `asyncio.gather`-of-tasks shape (one
//! coroutine per flag/timer) and the teacher's `engine::generic::Engine::run`
//! loop-with-sleep idiom, generalized from one synchronous tick loop to
//! several cooperating async tasks per §5's scheduling model. A single
//! `SymbolSupervisor` is shared (via `Arc`) across every loop spawned for its
//! symbol; loops never clone its mutexes, only reference them.

use super::supervisor::SymbolSupervisor;
use crate::oms::Oms;
use crate::pe::PositionExecutor;
use crate::qg::QuoteGenerator;
use crate::venue::VenueClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// §4.2 periodic resync: re-fetch the book snapshot via the venue client and
/// feed it through `OBR::refresh`. The only writer to `supervisor.book`; runs
/// until `supervisor.is_shutting_down()`.
pub async fn market_data_loop<V: VenueClient>(
    supervisor: Arc<SymbolSupervisor>,
    venue: Arc<V>,
    depth: usize,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    let mut seq_id = 0u64;
    loop {
        ticker.tick().await;
        if supervisor.is_shutting_down() {
            return;
        }
        match venue.get_orderbook(&supervisor.symbol, depth).await {
            Ok(snapshot) => {
                seq_id += 1;
                let now = now_ms();
                let mut book = supervisor.book.lock().await;
                if let Err(e) = book.refresh(&snapshot.bids, &snapshot.asks, now, seq_id) {
                    warn!(symbol = %supervisor.symbol, error = %e, "book resync rejected");
                }
            }
            Err(e) => warn!(symbol = %supervisor.symbol, error = %e, "resync fetch failed"),
        }
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// §4.5 + §4.7 steps 1-5: every `interval`, compute the desired order set
/// from the current book/position and reconcile it against resting orders.
/// Runs until `supervisor.is_shutting_down()`.
pub async fn tick_loop<Q: QuoteGenerator + ?Sized>(
    supervisor: Arc<SymbolSupervisor>,
    mut qg: Box<Q>,
    oms: Oms,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        if supervisor.is_shutting_down() {
            return;
        }
        let now = now_ms();
        let proposed = {
            let book = supervisor.book.lock().await;
            let position = supervisor.position.lock().await;
            qg.generate(&book, &position, now)
        };
        if proposed.is_empty() {
            continue;
        }
        let mid = {
            let book = supervisor.book.lock().await;
            book.mid()
        };
        let Some(mid) = mid else {
            debug!(symbol = %supervisor.symbol, "skipping reconcile tick: book has no mid yet");
            continue;
        };
        let mut oss = supervisor.oss.lock().await;
        let position = supervisor.position.lock().await;
        oms.reconcile(&mut oss, proposed, mid, &position, now);
    }
}

/// §4.6: wait on the `position` flag, run PE's planning on wake. Runs until
/// `supervisor.is_shutting_down()`.
pub async fn position_executor_loop(supervisor: Arc<SymbolSupervisor>, mut pe: PositionExecutor) {
    loop {
        supervisor.flags.position.wait().await;
        if supervisor.is_shutting_down() {
            return;
        }
        let now = now_ms();
        let mut oss = supervisor.oss.lock().await;
        let position = supervisor.position.lock().await;
        pe.on_wake(&mut oss, &position, &supervisor.symbol, now);
    }
}

/// §4.7 monitored drain: park on any of the three intent flags, drain the
/// corresponding map, dispatch the venue batch call, clear the flag only
/// after the call completes (§5 ordering: "producer mutates map then sets
/// flag" — this is the matching consumer-side rule, "drain fully before
/// clearing").
pub async fn oms_drain_loop<V: VenueClient>(supervisor: Arc<SymbolSupervisor>, venue: Arc<V>) {
    loop {
        let woken = tokio::select! {
            _ = supervisor.flags.to_create.wait() => Woken::Create,
            _ = supervisor.flags.to_amend.wait() => Woken::Amend,
            _ = supervisor.flags.to_cancel.wait() => Woken::Cancel,
        };
        if supervisor.is_shutting_down() {
            return;
        }
        let now = now_ms();
        let mut oss = supervisor.oss.lock().await;
        match woken {
            Woken::Create => {
                Oms::drain_and_dispatch_create(&mut oss, venue.as_ref(), now).await;
                oss.flags.to_create.clear();
            }
            Woken::Amend => {
                Oms::drain_and_dispatch_amend(&mut oss, venue.as_ref(), now).await;
                oss.flags.to_amend.clear();
            }
            Woken::Cancel => {
                Oms::drain_and_dispatch_cancel(&mut oss, venue.as_ref(), now).await;
                oss.flags.to_cancel.clear();
            }
        }
    }
}

enum Woken {
    Create,
    Amend,
    Cancel,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::order::{ClientOrderId, Side};
    use crate::pe::PositionExecutorParams;
    use crate::qg::{SandboxParams, SandboxQuoteGenerator};
    use crate::venue::simulated::SimulatedVenueClient;

    #[tokio::test]
    async fn oms_drain_loop_moves_queued_create_into_in_the_book() {
        let supervisor = Arc::new(SymbolSupervisor::new("BTC-PERP", 10, 0));
        let venue = Arc::new(SimulatedVenueClient::new());

        {
            let mut oss = supervisor.oss.lock().await;
            let order = crate::core::order::Order::new_limit(
                "BTC-PERP",
                Side::Buy,
                1.0,
                100.0,
                crate::core::order::TimeInForce::PostOnly,
                ClientOrderId::encode(1, 1),
                0,
            );
            let id = order.client_order_id;
            oss.queue_create(order);
            let _ = id;
        }

        let handle = tokio::spawn(oms_drain_loop(supervisor.clone(), venue));
        tokio::time::sleep(Duration::from_millis(50)).await;
        supervisor
            .shutdown_signal()
            .store(true, std::sync::atomic::Ordering::Release);
        // Unblock the loop's final wait so it observes shutdown and returns.
        supervisor.oss.lock().await.flags.to_create.set();
        let _ = tokio::time::timeout(Duration::from_millis(200), handle).await;

        let oss = supervisor.oss.lock().await;
        assert_eq!(
            oss.partition_of(ClientOrderId::encode(1, 1)),
            Some(crate::oss::store::Partition::InTheBook)
        );
    }

    #[tokio::test]
    async fn position_executor_loop_queues_take_profit_on_wake() {
        let supervisor = Arc::new(SymbolSupervisor::new("BTC-PERP", 10, 0));
        {
            let mut position = supervisor.position.lock().await;
            position.apply_fill(Side::Buy, 100.0, 1.0, 0);
            let oss = supervisor.oss.lock().await;
            oss.flags.position.set();
        }
        let pe = PositionExecutor::new(PositionExecutorParams {
            take_profit_bps: 10.0,
            liquidation_timer_ms: 60_000,
        });
        let handle = tokio::spawn(position_executor_loop(supervisor.clone(), pe));
        tokio::time::sleep(Duration::from_millis(50)).await;
        supervisor
            .shutdown_signal()
            .store(true, std::sync::atomic::Ordering::Release);
        supervisor.oss.lock().await.flags.position.set();
        let _ = tokio::time::timeout(Duration::from_millis(200), handle).await;

        let oss = supervisor.oss.lock().await;
        assert_eq!(oss.to_create_snapshot().len(), 1);
    }

    #[tokio::test]
    async fn tick_loop_generates_and_queues_orders_from_a_populated_book() {
        let supervisor = Arc::new(SymbolSupervisor::new("BTC-PERP", 10, 0));
        {
            let mut book = supervisor.book.lock().await;
            book.refresh(&[(99.0, 1.0)], &[(101.0, 1.0)], 1, 1).unwrap();
        }
        let qg = Box::new(SandboxQuoteGenerator::new(SandboxParams {
            total_orders: 4,
            max_position: 1000.0,
            minimum_spread_bps: 5.0,
            tick_size: 0.01,
            symbol: "BTC-PERP".to_string(),
        }));
        let oms = Oms::new(crate::oms::OmsParams {
            total_orders: 4,
            max_position: 1000.0,
            ..Default::default()
        });
        let handle = tokio::spawn(tick_loop(supervisor.clone(), qg, oms, Duration::from_millis(10)));
        tokio::time::sleep(Duration::from_millis(60)).await;
        supervisor
            .shutdown_signal()
            .store(true, std::sync::atomic::Ordering::Release);
        let _ = tokio::time::timeout(Duration::from_millis(200), handle).await;

        let oss = supervisor.oss.lock().await;
        assert!(!oss.in_flight().is_empty(), "tick loop should have proposed at least one order");
    }
}

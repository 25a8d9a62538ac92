//! Position Executor (PE) — §4.6.
//!
//! Runs as a long-lived task that waits on the `position` [`Event`](crate::oss::Event)
//! flag and, on wake, plans the take-profit order (or, once the liquidation
//! timer has expired, a reduce-only market close) and queues it onto the
//! OSS intent maps for the OMS to dispatch.
//!
//! Grounded on `original_source/src/marketmaking/oms/oms.py`'s
//! task-driven-by-flag idiom; the take-profit/liquidation-timer algorithm
//! itself is spec-native (§4.6) since the teacher has no TP/liquidation-timer
//! concept — its *sequencing* (ordered guard checks before emitting a single
//! action) follows `engine::generic::Engine::process_tick`'s drawdown/risk
//! check ordering.

use crate::core::order::{ClientOrderId, Order, OrderType, Side, TimeInForce};
use crate::core::position::{Position, POSITION_EPS};
use crate::oss::store::OrderStateStore;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
pub struct PositionExecutorParams {
    pub take_profit_bps: f64,
    pub liquidation_timer_ms: u64,
}

pub struct PositionExecutor {
    params: PositionExecutorParams,
    tp_sequence: i64,
}

impl PositionExecutor {
    pub fn new(params: PositionExecutorParams) -> Self {
        Self {
            params,
            tp_sequence: 0,
        }
    }

    fn next_tp_id(&mut self) -> ClientOrderId {
        self.tp_sequence += 1;
        ClientOrderId::encode(0, self.tp_sequence)
    }

    /// Take-profit closing side: opposite of the position's resting side.
    fn closing_side(position: &Position) -> Side {
        if position.size > 0.0 {
            Side::Sell
        } else {
            Side::Buy
        }
    }

    fn take_profit_price(&self, position: &Position) -> Option<f64> {
        let entry = position.entry_price?;
        let offset = entry * self.params.take_profit_bps * 1e-4;
        Some(match Self::closing_side(position) {
            Side::Sell => entry + offset,
            Side::Buy => entry - offset,
        })
    }

    /// React to a wake on the `position` flag (§4.6). Mutates `oss` with the
    /// planned create/amend (or does nothing, per the "wait for ack" branch)
    /// and always clears the `position` flag before returning, matching the
    /// "producer mutates then sets/clears" ordering in §5.
    pub fn on_wake(&mut self, oss: &mut OrderStateStore, position: &Position, symbol: &str, now: u64) {
        if position.is_flat() {
            oss.flags.position.clear();
            return;
        }
        if position.size.abs() <= POSITION_EPS {
            oss.flags.position.clear();
            return;
        }

        if now.saturating_sub(position.open_time) >= self.params.liquidation_timer_ms {
            self.plan_liquidation(oss, position, symbol, now);
            oss.flags.position.clear();
            return;
        }

        self.plan_take_profit(oss, position, symbol, now);
        oss.flags.position.clear();
    }

    fn plan_liquidation(&mut self, oss: &mut OrderStateStore, position: &Position, symbol: &str, now: u64) {
        info!(symbol, size = position.size, "liquidation timer expired, queuing reduce-only market close");
        let side = Self::closing_side(position);
        let id = self.next_tp_id();
        let order = Order::new_reduce_only_market(symbol, side, position.size.abs(), id, now);
        oss.queue_create(order);
    }

    fn plan_take_profit(&mut self, oss: &mut OrderStateStore, position: &Position, symbol: &str, now: u64) {
        let Some(tp_price) = self.take_profit_price(position) else {
            return;
        };
        let side = Self::closing_side(position);
        let size = position.size.abs();

        let active_tp: Vec<ClientOrderId> = oss
            .tp_tags()
            .iter()
            .copied()
            .filter(|id| oss.in_the_book().contains(id))
            .collect();

        if !active_tp.is_empty() {
            if active_tp.len() > 1 {
                // Keep only the most recently opened active TP; cancel the rest.
                let mut by_ts: Vec<(ClientOrderId, u64)> = active_tp
                    .iter()
                    .filter_map(|id| oss.order(*id).map(|o| (*id, o.timestamp)))
                    .collect();
                by_ts.sort_by_key(|(_, ts)| std::cmp::Reverse(*ts));
                for (id, _) in by_ts.into_iter().skip(1) {
                    oss.request_cancel(id);
                }
                return;
            }

            let existing_id = active_tp[0];
            let Some(existing) = oss.order(existing_id) else {
                return;
            };
            let candidate = Order::new_limit(symbol, side, size, tp_price, TimeInForce::Gtc, existing_id, now);
            if candidate == *existing {
                debug!(symbol, %existing_id, "planned TP identical to active TP, skipping");
                return;
            }
            let mut amend = candidate;
            amend.venue_order_id = existing.venue_order_id.clone();
            oss.queue_amend(amend);
            return;
        }

        // No active TP. If one is still in flight, wait for its ack rather
        // than submitting a duplicate (§4.6 step 2, "none active but a
        // previous TP is still in flight").
        let in_flight_tp = oss
            .tp_tags()
            .iter()
            .any(|id| oss.in_flight().contains(id) || oss.to_be_triggered().contains(id));
        if in_flight_tp {
            return;
        }

        let id = self.next_tp_id();
        let order = Order::new_limit(symbol, side, size, tp_price, TimeInForce::Gtc, id, now);
        oss.tag_tp(id);
        oss.queue_create(order);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oss::store::TerminalKind;

    fn opened_long(oss: &mut OrderStateStore, size: f64, ts: u64) -> Position {
        let mut p = Position::flat("BTC-PERP", ts);
        p.apply_fill(Side::Buy, 100.0, size, ts);
        oss.flags.position.set();
        p
    }

    #[test]
    fn flat_position_clears_flag_without_queuing() {
        let mut oss = OrderStateStore::new();
        oss.flags.position.set();
        let position = Position::flat("BTC-PERP", 0);
        let mut pe = PositionExecutor::new(PositionExecutorParams {
            take_profit_bps: 10.0,
            liquidation_timer_ms: 60_000,
        });
        pe.on_wake(&mut oss, &position, "BTC-PERP", 1);
        assert!(!oss.flags.position.is_set());
        assert!(oss.to_create_snapshot().is_empty());
    }

    #[test]
    fn first_wake_queues_a_create_and_tags_tp() {
        let mut oss = OrderStateStore::new();
        let position = opened_long(&mut oss, 1.0, 0);
        let mut pe = PositionExecutor::new(PositionExecutorParams {
            take_profit_bps: 10.0,
            liquidation_timer_ms: 60_000,
        });
        pe.on_wake(&mut oss, &position, "BTC-PERP", 1);
        assert_eq!(oss.to_create_snapshot().len(), 1);
        assert!(!oss.flags.position.is_set());
    }

    #[test]
    fn liquidation_timer_expiry_queues_reduce_only_market() {
        // §8 scenario 5
        let mut oss = OrderStateStore::new();
        let position = opened_long(&mut oss, 0.5, 0);
        let mut pe = PositionExecutor::new(PositionExecutorParams {
            take_profit_bps: 10.0,
            liquidation_timer_ms: 1000,
        });
        pe.on_wake(&mut oss, &position, "BTC-PERP", 1001);
        let created: Vec<_> = oss.drain_create();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].order_type, OrderType::Market);
        assert!(created[0].reduce_only);
        assert_eq!(created[0].size, 0.5);
    }

    #[test]
    fn active_tp_identical_to_plan_is_skipped() {
        let mut oss = OrderStateStore::new();
        let position = opened_long(&mut oss, 1.0, 0);
        let mut pe = PositionExecutor::new(PositionExecutorParams {
            take_profit_bps: 100.0,
            liquidation_timer_ms: 60_000,
        });
        pe.on_wake(&mut oss, &position, "BTC-PERP", 1);
        let created = oss.drain_create();
        let tp_order = created.into_iter().next().unwrap();
        let id = tp_order.client_order_id;
        oss.submit(tp_order);
        oss.ack_open(id, "v1".into(), 2);

        oss.flags.position.set();
        pe.on_wake(&mut oss, &position, "BTC-PERP", 3);
        assert!(oss.to_create_snapshot().is_empty());
        assert!(oss.to_amend_snapshot().is_empty());
    }

    #[test]
    fn multiple_active_tps_cancels_all_but_most_recent() {
        let mut oss = OrderStateStore::new();
        let position = opened_long(&mut oss, 1.0, 0);

        let id1 = ClientOrderId::encode(0, 1);
        let mut o1 = Order::new_limit("BTC-PERP", Side::Sell, 1.0, 110.0, TimeInForce::Gtc, id1, 1);
        o1.status = crate::core::order::OrderStatus::InTheBook;
        oss.submit(o1);
        oss.ack_open(id1, "v1".into(), 1);
        oss.tag_tp(id1);

        let id2 = ClientOrderId::encode(0, 2);
        let mut o2 = Order::new_limit("BTC-PERP", Side::Sell, 1.0, 111.0, TimeInForce::Gtc, id2, 5);
        o2.status = crate::core::order::OrderStatus::InTheBook;
        oss.submit(o2);
        oss.ack_open(id2, "v2".into(), 5);
        oss.tag_tp(id2);

        let mut pe = PositionExecutor::new(PositionExecutorParams {
            take_profit_bps: 50.0,
            liquidation_timer_ms: 60_000,
        });
        oss.flags.position.set();
        pe.on_wake(&mut oss, &position, "BTC-PERP", 6);

        assert!(oss.to_cancel_snapshot().contains_key(&id1));
        assert!(!oss.to_cancel_snapshot().contains_key(&id2));
    }

    #[test]
    fn terminal_fill_on_tp_clears_tag() {
        let mut oss = OrderStateStore::new();
        let id = ClientOrderId::encode(0, 1);
        oss.submit(Order::new_limit("BTC-PERP", Side::Sell, 1.0, 110.0, TimeInForce::Gtc, id, 1));
        oss.tag_tp(id);
        oss.ack_open(id, "v1".into(), 1);
        oss.terminal(id, TerminalKind::Filled, 2);
        assert!(!oss.is_tp(id));
    }
}

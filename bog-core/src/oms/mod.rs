//! OMS Reconciler — §4.7.
//!
//! Two cooperating halves, both described in the spec as "modes of
//! operation, both active":
//! - [`reconcile`]: the tick-driven diff between the quote generator's
//!   desired order set and the currently resting orders (duplicate
//!   suppression, level match, out-of-bounds replace, risk check, overflow).
//! - [`Oms::drain_and_dispatch_*`]: the monitored-drain half that waits on
//!   the `to_create`/`to_amend`/`to_cancel` flags and issues the venue
//!   client's batch endpoints, matching results back by id (§4.7.1
//!   `order_error`).
//!
//! Grounded on `original_source/src/marketmaking/oms/oms.py::update` for the
//! duplicate-suppression/out-of-bounds/overflow algorithm, and
//! `engine::generic::Engine`'s `RiskManager`/`CircuitBreaker` integration
//! pattern for where the risk check sits in the pipeline.

use crate::core::order::{ClientOrderId, Order, Side};
use crate::core::position::Position;
use crate::oss::store::OrderStateStore;
use crate::venue::{OrderResult, VenueClient};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub struct OmsParams {
    /// Fraction of distance-from-mid tolerated before a resting order is
    /// replaced rather than left alone (§4.7 step 3, default `0.2`).
    pub sensitivity: f64,
    /// USD notional risk ceiling (§4.7 step 4).
    pub max_position: f64,
    /// Target resting-order count across both sides (§4.7 step 5).
    pub total_orders: usize,
    /// An `in_flight` order older than this is treated as lost (§4.7 step 1,
    /// §5; spec default 3s).
    pub lost_in_flight_ms: u64,
}

impl Default for OmsParams {
    fn default() -> Self {
        Self {
            sensitivity: 0.2,
            max_position: 0.0,
            total_orders: 0,
            lost_in_flight_ms: 3_000,
        }
    }
}

pub struct Oms {
    params: OmsParams,
}

impl Oms {
    pub fn new(params: OmsParams) -> Self {
        Self { params }
    }

    /// Tick-driven reconciliation (§4.7): diffs `proposed` against the
    /// resting state in `oss` and queues creates/cancels. Called once per QG
    /// invocation with the full proposed order set.
    pub fn reconcile(&self, oss: &mut OrderStateStore, proposed: Vec<Order>, mid: f64, position: &Position, now: u64) {
        for order in proposed {
            self.reconcile_one(oss, order, mid, position, now);
        }
    }

    fn reconcile_one(&self, oss: &mut OrderStateStore, proposal: Order, mid: f64, position: &Position, now: u64) {
        // Step 1: duplicate suppression / lost-in-flight re-proposal.
        if let Some(existing_id) = Self::find_equal_in_flight(oss, &proposal) {
            let age = now.saturating_sub(oss.order(existing_id).map(|o| o.timestamp).unwrap_or(now));
            if age < self.params.lost_in_flight_ms {
                return;
            }
            info!(%existing_id, age, "in_flight order presumed lost, evicting and re-proposing");
            oss.evict_lost_in_flight(existing_id);
            oss.queue_create(proposal);
            return;
        }

        // Step 2 + 3: level match, then out-of-bounds replace.
        let level = proposal.client_order_id.level();
        if let Some(existing_id) = Self::find_resting_by_level(oss, level) {
            let existing_price = oss.order(existing_id).and_then(|o| o.price);
            let in_bounds = match (existing_price, proposal.price) {
                (Some(old_price), Some(new_price)) => {
                    let distance = (new_price - mid).abs();
                    let buffer = distance * self.params.sensitivity;
                    (old_price - new_price).abs() <= buffer
                }
                _ => false,
            };
            if !in_bounds {
                oss.request_cancel(existing_id);
                self.create_respecting_overflow(oss, proposal, mid);
            }
            return;
        }

        // Step 4: risk check for a brand-new level.
        if let Some(entry) = position.entry_price {
            let proposal_price = proposal.price.unwrap_or(mid);
            let projected = (position.size * entry + proposal.side.sign() * proposal.size * proposal_price).abs();
            if projected > self.params.max_position {
                warn!(level, projected, limit = self.params.max_position, "new order would breach max_position, skipping");
                return;
            }
        }

        self.create_respecting_overflow(oss, proposal, mid);
    }

    /// Step 5: if resting non-TP orders already fill the ladder, cancel the
    /// one closest to mid on the proposal's side before creating.
    fn create_respecting_overflow(&self, oss: &mut OrderStateStore, proposal: Order, mid: f64) {
        let tp_in_book = oss.tp_tags().iter().filter(|id| oss.in_the_book().contains(*id)).count();
        let quoting_count = oss.in_the_book().len().saturating_sub(tp_in_book);
        if quoting_count >= self.params.total_orders {
            if let Some(victim) = Self::closest_resting_on_side(oss, proposal.side, mid) {
                oss.request_cancel(victim);
            }
        }
        oss.queue_create(proposal);
    }

    fn find_equal_in_flight(oss: &OrderStateStore, proposal: &Order) -> Option<ClientOrderId> {
        oss.in_flight()
            .iter()
            .find(|id| oss.order(**id) == Some(proposal))
            .copied()
    }

    fn find_resting_by_level(oss: &OrderStateStore, level: i32) -> Option<ClientOrderId> {
        oss.in_the_book()
            .iter()
            .find(|id| id.level() == level)
            .copied()
    }

    fn closest_resting_on_side(oss: &OrderStateStore, side: Side, mid: f64) -> Option<ClientOrderId> {
        let tp = oss.tp_tags();
        let mut best: Option<(ClientOrderId, f64)> = None;
        for id in oss.in_the_book().iter() {
            let id = *id;
            if tp.contains(&id) {
                continue;
            }
            let Some(order) = oss.order(id) else { continue };
            if order.side != side {
                continue;
            }
            let Some(price) = order.price else { continue };
            let distance = (price - mid).abs();
            if best.map(|(_, d)| distance < d).unwrap_or(true) {
                best = Some((id, distance));
            }
        }
        best.map(|(id, _)| id)
    }

    /// §4.7.1: remove `id` from every intent/tag/in_flight set it might be
    /// in. Never touches `in_the_book`.
    pub fn order_error(oss: &mut OrderStateStore, id: ClientOrderId) {
        oss.order_error(id);
    }

    /// Drain `to_create`, dispatch the batch, and fold the response back
    /// into `oss` (ack -> `ack_open`, rejection -> `order_error`). Caller is
    /// responsible for clearing `oss.flags.to_create` only after this
    /// returns (§4.7 monitored-drain contract).
    pub async fn drain_and_dispatch_create<V: VenueClient>(oss: &mut OrderStateStore, venue: &V, now: u64) {
        let batch = oss.drain_create();
        if batch.is_empty() {
            return;
        }
        match venue.batch_create(batch).await {
            Ok(response) => Self::apply_create_response(oss, response, now),
            Err(e) => warn!(error = %e, "batch_create transport error, orders remain in_flight for retry"),
        }
    }

    pub async fn drain_and_dispatch_amend<V: VenueClient>(oss: &mut OrderStateStore, venue: &V, now: u64) {
        let batch = oss.drain_amend();
        if batch.is_empty() {
            return;
        }
        let sizes: std::collections::HashMap<ClientOrderId, (Option<f64>, f64)> =
            batch.iter().map(|o| (o.client_order_id, (o.price, o.size))).collect();
        match venue.batch_amend(batch).await {
            Ok(response) => {
                for (id, result) in response {
                    match result {
                        OrderResult::Acked { .. } => {
                            if let Some((price, size)) = sizes.get(&id) {
                                oss.apply_amend(id, *price, *size, now);
                            }
                        }
                        OrderResult::Rejected { reason } => {
                            warn!(%id, reason = %reason, "amend rejected");
                            Self::order_error(oss, id);
                        }
                    }
                }
            }
            Err(e) => warn!(error = %e, "batch_amend transport error"),
        }
    }

    pub async fn drain_and_dispatch_cancel<V: VenueClient>(oss: &mut OrderStateStore, venue: &V, now: u64) {
        let batch = oss.drain_cancel();
        if batch.is_empty() {
            return;
        }
        match venue.batch_cancel(batch).await {
            Ok(response) => {
                for (id, result) in response {
                    match result {
                        OrderResult::Acked { .. } => {
                            oss.terminal(id, crate::oss::store::TerminalKind::Canceled, now);
                        }
                        OrderResult::Rejected { reason } => {
                            warn!(%id, reason = %reason, "cancel rejected");
                            Self::order_error(oss, id);
                        }
                    }
                }
            }
            Err(e) => warn!(error = %e, "batch_cancel transport error"),
        }
    }

    fn apply_create_response(oss: &mut OrderStateStore, response: crate::venue::BatchResponse, now: u64) {
        for (id, result) in response {
            match result {
                OrderResult::Acked { venue_order_id } => {
                    oss.ack_open(id, venue_order_id, now);
                }
                OrderResult::Rejected { reason } => {
                    warn!(%id, reason = %reason, "create rejected");
                    Self::order_error(oss, id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::order::{Order, OrderType, Side, TimeInForce};
    use crate::venue::simulated::SimulatedVenueClient;

    fn limit(side: Side, price: f64, level: i32, seq: i64) -> Order {
        Order::new_limit("BTC-PERP", side, 1.0, price, TimeInForce::PostOnly, ClientOrderId::encode(level, seq), 0)
    }

    #[test]
    fn duplicate_suppression_drops_recent_in_flight_proposal() {
        // §8 scenario 2
        let mut oss = OrderStateStore::new();
        let order = limit(Side::Buy, 100.0, -1, -1);
        oss.submit(order.clone());
        let oms = Oms::new(OmsParams {
            total_orders: 10,
            max_position: 1_000_000.0,
            ..Default::default()
        });
        let position = Position::flat("BTC-PERP", 0);
        oms.reconcile(&mut oss, vec![limit(Side::Buy, 100.0, -1, -2)], 100.5, &position, 500);
        assert_eq!(oss.in_flight().len(), 1, "duplicate should not create a second in_flight order");
    }

    #[test]
    fn lost_in_flight_after_3s_is_reproposed() {
        let mut oss = OrderStateStore::new();
        let mut order = limit(Side::Buy, 100.0, -1, -1);
        order.timestamp = 0;
        oss.submit(order);
        let oms = Oms::new(OmsParams {
            total_orders: 10,
            max_position: 1_000_000.0,
            ..Default::default()
        });
        let position = Position::flat("BTC-PERP", 0);
        oms.reconcile(&mut oss, vec![limit(Side::Buy, 100.0, -1, -2)], 100.5, &position, 4_000);
        assert_eq!(oss.in_flight().len(), 1);
        assert_eq!(oss.to_create_snapshot().len(), 1);
    }

    #[test]
    fn out_of_bounds_replace_cancels_and_creates() {
        // §8 scenario 3: old 99.50, new proposal 99.70, mid 100.10, sensitivity 0.2
        let mut oss = OrderStateStore::new();
        let existing_id = ClientOrderId::encode(1, 1);
        let mut existing = limit(Side::Buy, 99.50, 1, 1);
        existing.client_order_id = existing_id;
        oss.submit(existing);
        oss.ack_open(existing_id, "v1".into(), 1);

        let oms = Oms::new(OmsParams {
            sensitivity: 0.2,
            total_orders: 10,
            max_position: 1_000_000.0,
            ..Default::default()
        });
        let position = Position::flat("BTC-PERP", 0);
        let proposal = limit(Side::Buy, 99.70, 1, 2);
        oms.reconcile(&mut oss, vec![proposal], 100.10, &position, 10);

        assert!(oss.to_cancel_snapshot().contains_key(&existing_id));
        assert_eq!(oss.to_create_snapshot().len(), 1);
    }

    #[test]
    fn in_bounds_match_is_left_alone() {
        let mut oss = OrderStateStore::new();
        let existing_id = ClientOrderId::encode(1, 1);
        let mut existing = limit(Side::Buy, 99.97, 1, 1);
        existing.client_order_id = existing_id;
        oss.submit(existing);
        oss.ack_open(existing_id, "v1".into(), 1);

        let oms = Oms::new(OmsParams {
            sensitivity: 5.0,
            total_orders: 10,
            max_position: 1_000_000.0,
            ..Default::default()
        });
        let position = Position::flat("BTC-PERP", 0);
        let proposal = limit(Side::Buy, 99.98, 1, 2);
        oms.reconcile(&mut oss, vec![proposal], 100.0, &position, 10);

        assert!(oss.to_cancel_snapshot().is_empty());
        assert!(oss.to_create_snapshot().is_empty());
    }

    #[test]
    fn overflow_cancels_closest_resting_order_on_side_before_creating() {
        let mut oss = OrderStateStore::new();
        for (level, price) in [(1, 101.0), (2, 102.0)] {
            let id = ClientOrderId::encode(level, 1);
            let mut o = limit(Side::Sell, price, level, 1);
            o.client_order_id = id;
            oss.submit(o);
            oss.ack_open(id, format!("v{level}"), 1);
        }
        let oms = Oms::new(OmsParams {
            total_orders: 2,
            max_position: 1_000_000.0,
            ..Default::default()
        });
        let position = Position::flat("BTC-PERP", 0);
        let proposal = limit(Side::Sell, 103.0, 3, 1);
        oms.reconcile(&mut oss, vec![proposal], 100.0, &position, 10);
        // closest to mid(100) among [101, 102] is 101 (level 1)
        assert!(oss.to_cancel_snapshot().contains_key(&ClientOrderId::encode(1, 1)));
    }

    #[test]
    fn risk_check_skips_new_order_that_would_breach_max_position() {
        let mut oss = OrderStateStore::new();
        let oms = Oms::new(OmsParams {
            total_orders: 10,
            max_position: 100.0,
            ..Default::default()
        });
        let mut position = Position::flat("BTC-PERP", 0);
        position.apply_fill(Side::Buy, 100.0, 2.0, 0); // size*entry = 200, already over 100
        let proposal = limit(Side::Buy, 100.0, -1, -1);
        oms.reconcile(&mut oss, vec![proposal], 100.0, &position, 10);
        assert!(oss.to_create_snapshot().is_empty());
        assert!(oss.in_flight().is_empty());
    }

    #[tokio::test]
    async fn create_batch_ack_moves_order_to_in_the_book() {
        let mut oss = OrderStateStore::new();
        let order = limit(Side::Buy, 100.0, -1, -1);
        let id = order.client_order_id;
        oss.queue_create(order);
        let venue = SimulatedVenueClient::new();
        Oms::drain_and_dispatch_create(&mut oss, &venue, 5).await;
        assert_eq!(oss.partition_of(id), Some(crate::oss::store::Partition::InTheBook));
    }

    #[tokio::test]
    async fn create_batch_rejection_runs_order_error() {
        let mut oss = OrderStateStore::new();
        let order = limit(Side::Buy, 100.0, -1, -1);
        let id = order.client_order_id;
        oss.queue_create(order);
        let venue = SimulatedVenueClient::new();
        *venue.reject_all.lock().unwrap() = Some("nope".into());
        Oms::drain_and_dispatch_create(&mut oss, &venue, 5).await;
        assert_eq!(oss.partition_of(id), None);
    }

    #[test]
    fn order_type_reexport_is_visible() {
        let _ = OrderType::Limit;
    }
}

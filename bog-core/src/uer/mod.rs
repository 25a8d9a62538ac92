//! User-Event Reducer (UER) — §4.4.
//!
//! Grounded on `original_source/src/marketmaking/oms/oms.py::order_error`'s
//! "always drain, extensively log, idempotent on replay" idiom and the
//! teacher's `engine::generic::Engine::drain_executor_fills` for the same
//! property applied to a different event source. Consumes a normalized
//! `(channel, payload)` stream from the private websocket; processing is
//! single-threaded per symbol (§5).

use crate::core::order::{ClientOrderId, Side};
use crate::core::position::Position;
use crate::oss::store::{OrderStateStore, TerminalKind};
use tracing::{info, warn};

/// A normalized private-stream event, already decoded from the venue's wire
/// format by the (out-of-scope, §1) venue codec.
#[derive(Debug, Clone)]
pub enum UserEvent {
    /// Order acknowledged as resting ("open" status).
    OrderOpen {
        client_order_id: Option<ClientOrderId>,
        venue_order_id: String,
        symbol: String,
        side: Side,
        size: f64,
        ts: u64,
    },
    /// A conditional order's trigger condition fired.
    OrderTriggered { client_order_id: ClientOrderId, ts: u64 },
    /// Terminal order event: filled, canceled, rejected, or margin-canceled.
    OrderTerminal {
        client_order_id: ClientOrderId,
        kind: TerminalKind,
        ts: u64,
    },
    /// A fill against our position (from the fills stream).
    Fill {
        side: Side,
        price: f64,
        size: f64,
        ts: u64,
    },
    /// An authoritative account/position snapshot.
    PositionSnapshot {
        size: f64,
        entry_price: Option<f64>,
        ts: u64,
    },
}

/// Consumes [`UserEvent`]s and drives [`OrderStateStore`] transitions and
/// [`Position`] updates. Owns neither — both are shared with OMS/PE/QG per
/// the §5 ownership rules, but mutated only from here (and from OMS'
/// reconciliation branch).
pub struct UserEventReducer<'a> {
    pub oss: &'a mut OrderStateStore,
    pub position: &'a mut Position,
}

impl<'a> UserEventReducer<'a> {
    pub fn new(oss: &'a mut OrderStateStore, position: &'a mut Position) -> Self {
        Self { oss, position }
    }

    pub fn process(&mut self, event: UserEvent) {
        match event {
            UserEvent::OrderOpen {
                client_order_id,
                venue_order_id,
                symbol,
                side,
                size,
                ts,
            } => self.handle_open(client_order_id, venue_order_id, symbol, side, size, ts),
            UserEvent::OrderTriggered { client_order_id, ts } => {
                if !self.oss.triggered(client_order_id) {
                    warn!(%client_order_id, ts, "triggered event for id not in to_be_triggered, ignoring (idempotent replay or unknown id)");
                }
            }
            UserEvent::OrderTerminal {
                client_order_id,
                kind,
                ts,
            } => {
                self.oss.terminal(client_order_id, kind, ts);
            }
            UserEvent::Fill { side, price, size, ts } => self.handle_fill(side, price, size, ts),
            UserEvent::PositionSnapshot { size, entry_price, ts } => {
                self.position.reconcile_from_snapshot(size, entry_price, ts);
                self.sync_position_flag();
            }
        }
    }

    fn handle_open(
        &mut self,
        client_order_id: Option<ClientOrderId>,
        venue_order_id: String,
        symbol: String,
        side: Side,
        size: f64,
        ts: u64,
    ) {
        let Some(id) = client_order_id else {
            info!(venue_order_id, "foreign open with no client_order_id, queuing cancel");
            self.oss
                .queue_foreign_cancel(symbol, side, size, Some(venue_order_id), ts);
            return;
        };

        if !self.oss.ack_open(id, venue_order_id.clone(), ts) {
            info!(%id, venue_order_id, "open ack for id not in in_flight, treating as foreign and canceling");
            self.oss
                .queue_foreign_cancel(symbol, side, size, Some(venue_order_id), ts);
        }
    }

    fn handle_fill(&mut self, side: Side, price: f64, size: f64, ts: u64) {
        self.position.apply_fill(side, price, size, ts);
        self.sync_position_flag();
    }

    fn sync_position_flag(&self) {
        if self.position.is_flat() {
            self.oss.flags.position.clear();
        } else {
            self.oss.flags.position.set();
        }
    }
}

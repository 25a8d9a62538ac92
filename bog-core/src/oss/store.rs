//! Order State Store (OSS) — §4.3.
//!
//! Grounded on `original_source/src/marketmaking/oms/oms.py`'s partition-dict
//! idiom (`in_flight`/`to_be_triggered`/`in_the_book`/`to_cancel` as
//! maps keyed by client id) and spec §9's arena design note: an `Order` is
//! stored once, keyed by `ClientOrderId`; each lifecycle partition is a
//! `HashSet<ClientOrderId>`, never a set of object references, so a
//! transition is "move the id across sets and mutate the one arena entry" —
//! never two copies that can drift. `to_create`/`to_amend`/`to_cancel` are
//! intent maps (they carry the `Order` payload the OMS batch call needs, the
//! same way the teacher's `order_fsm.rs` treats a validated transition as
//! "returns the unchanged value on invalid input" rather than panicking).

use crate::core::order::{ClientOrderId, Order, OrderStatus};
use crate::oss::event::Event;
use std::collections::{HashMap, HashSet};

/// Which terminal venue event an order transitioned on (§4.3 transition table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    Filled,
    Canceled,
    Rejected,
    MarginCanceled,
}

/// Which lifecycle partition an id currently lives in, for the §8 disjointness
/// property and for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    InFlight,
    ToBeTriggered,
    InTheBook,
    ToCancel,
    RecentlyCancelled,
}

/// The four edge-triggered signals for this venue's symbol state (§3).
#[derive(Debug, Default)]
pub struct EventFlags {
    pub to_create: Event,
    pub to_amend: Event,
    pub to_cancel: Event,
    pub position: Event,
}

/// Synthesize a client id for a foreign order (no client-assigned id exists)
/// so it can still be tracked through the same arena/partition machinery.
/// Lives outside the level-encoding range (§3) by construction: the
/// level-encoded space is `level * 10^7 + sequence` with `|level| <= N/2`
/// for realistic ladder sizes, so offsetting by a large odd constant avoids
/// collisions for any `N` this system would plausibly configure.
const FOREIGN_ID_BASE: i64 = i64::MAX / 2;

fn foreign_client_id(venue_order_id: &str) -> ClientOrderId {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    venue_order_id.hash(&mut hasher);
    let h = (hasher.finish() as i64).unsigned_abs() as i64;
    ClientOrderId(FOREIGN_ID_BASE + (h % FOREIGN_ID_BASE))
}

#[derive(Default)]
pub struct OrderStateStore {
    arena: HashMap<ClientOrderId, Order>,

    in_flight: HashSet<ClientOrderId>,
    to_be_triggered: HashSet<ClientOrderId>,
    in_the_book: HashSet<ClientOrderId>,
    recently_cancelled: HashSet<ClientOrderId>,

    /// Intent queues: drained by the OMS, carrying the payload to submit.
    to_create: HashMap<ClientOrderId, Order>,
    to_amend: HashMap<ClientOrderId, Order>,
    to_cancel: HashMap<ClientOrderId, Order>,

    /// Tag sets (subset markers, not lifecycle partitions — DESIGN.md Open
    /// Question resolution).
    tp: HashSet<ClientOrderId>,
    sl: HashSet<ClientOrderId>,

    /// Shared with [`crate::engine::supervisor::SymbolSupervisor`] so the
    /// OMS-drain and PE task loops can wait on a flag without holding this
    /// store's own mutex for the duration of the wait (§5: the flag's
    /// edge-triggered semantics must not require exclusive access to drain).
    pub flags: std::sync::Arc<EventFlags>,
}

impl OrderStateStore {
    pub fn new() -> Self {
        Self::with_flags(std::sync::Arc::new(EventFlags::default()))
    }

    /// Construct a store that shares its flags with an externally-held
    /// `Arc<EventFlags>` (the supervisor's copy).
    pub fn with_flags(flags: std::sync::Arc<EventFlags>) -> Self {
        Self {
            arena: HashMap::new(),
            in_flight: HashSet::new(),
            to_be_triggered: HashSet::new(),
            in_the_book: HashSet::new(),
            recently_cancelled: HashSet::new(),
            to_create: HashMap::new(),
            to_amend: HashMap::new(),
            to_cancel: HashMap::new(),
            tp: HashSet::new(),
            sl: HashSet::new(),
            flags,
        }
    }

    pub fn order(&self, id: ClientOrderId) -> Option<&Order> {
        self.arena.get(&id)
    }

    pub fn partition_of(&self, id: ClientOrderId) -> Option<Partition> {
        if self.in_flight.contains(&id) {
            Some(Partition::InFlight)
        } else if self.to_be_triggered.contains(&id) {
            Some(Partition::ToBeTriggered)
        } else if self.in_the_book.contains(&id) {
            Some(Partition::InTheBook)
        } else if self.to_cancel.contains_key(&id) {
            Some(Partition::ToCancel)
        } else if self.recently_cancelled.contains(&id) {
            Some(Partition::RecentlyCancelled)
        } else {
            None
        }
    }

    pub fn in_flight(&self) -> &HashSet<ClientOrderId> {
        &self.in_flight
    }
    pub fn in_the_book(&self) -> &HashSet<ClientOrderId> {
        &self.in_the_book
    }
    pub fn to_be_triggered(&self) -> &HashSet<ClientOrderId> {
        &self.to_be_triggered
    }
    pub fn tp_tags(&self) -> &HashSet<ClientOrderId> {
        &self.tp
    }
    pub fn sl_tags(&self) -> &HashSet<ClientOrderId> {
        &self.sl
    }

    pub fn tag_tp(&mut self, id: ClientOrderId) {
        self.tp.insert(id);
    }
    pub fn tag_sl(&mut self, id: ClientOrderId) {
        self.sl.insert(id);
    }
    pub fn is_tp(&self, id: ClientOrderId) -> bool {
        self.tp.contains(&id)
    }

    // ---- submission ----------------------------------------------------

    /// `(none) -> in_flight`.
    pub fn submit(&mut self, mut order: Order) {
        order.status = OrderStatus::InFlight;
        let id = order.client_order_id;
        self.in_flight.insert(id);
        self.arena.insert(id, order);
    }

    // ---- UER transitions (§4.3, §4.4) -----------------------------------

    /// `in_flight -> ack "open" -> in_the_book | to_be_triggered`.
    /// Returns `false` if `id` was not in `in_flight` (already transitioned,
    /// i.e. idempotent replay, or a foreign id the caller must cancel).
    pub fn ack_open(&mut self, id: ClientOrderId, venue_order_id: String, ts: u64) -> bool {
        if !self.in_flight.remove(&id) {
            return false;
        }
        let conditional = self
            .arena
            .get(&id)
            .map(|o| o.order_type.is_conditional())
            .unwrap_or(false);
        if let Some(order) = self.arena.get_mut(&id) {
            order.venue_order_id = Some(venue_order_id);
            order.timestamp = ts;
            order.status = if conditional {
                OrderStatus::ToBeTriggered
            } else {
                OrderStatus::InTheBook
            };
        }
        if conditional {
            self.to_be_triggered.insert(id);
        } else {
            self.in_the_book.insert(id);
        }
        true
    }

    /// `to_be_triggered -> "triggered" -> in_the_book`.
    pub fn triggered(&mut self, id: ClientOrderId) -> bool {
        if !self.to_be_triggered.remove(&id) {
            return false;
        }
        if let Some(order) = self.arena.get_mut(&id) {
            order.status = OrderStatus::InTheBook;
        }
        self.in_the_book.insert(id);
        true
    }

    /// `in_the_book -> cancel requested -> to_cancel`.
    pub fn request_cancel(&mut self, id: ClientOrderId) -> bool {
        if !self.in_the_book.remove(&id) {
            return false;
        }
        if let Some(order) = self.arena.get_mut(&id) {
            order.status = OrderStatus::ToCancel;
            self.to_cancel.insert(id, order.clone());
        }
        self.flags.to_cancel.set();
        true
    }

    /// Queue a cancel for an order this store never tracked (UER §4.4: "no
    /// clientOrderId" or "id absent from in_flight" foreign-open handling).
    /// Returns the synthesized id so the caller can log it.
    pub fn queue_foreign_cancel(
        &mut self,
        symbol: impl Into<String>,
        side: crate::core::order::Side,
        size: f64,
        venue_order_id: Option<String>,
        ts: u64,
    ) -> ClientOrderId {
        let id = venue_order_id
            .as_deref()
            .map(foreign_client_id)
            .unwrap_or(ClientOrderId(FOREIGN_ID_BASE));
        let stub = Order::cancel_stub(symbol, side, size, venue_order_id, id, ts);
        self.to_cancel.insert(id, stub);
        self.flags.to_cancel.set();
        id
    }

    /// `to_cancel -> "canceled" ack -> recently_cancelled`, and the shared
    /// terminal-event handling for `filled | canceled | rejected | marginCanceled`.
    pub fn terminal(&mut self, id: ClientOrderId, kind: TerminalKind, ts: u64) -> bool {
        self.tp.remove(&id);
        self.sl.remove(&id);
        self.to_cancel.remove(&id);

        match kind {
            TerminalKind::Filled => {
                let moved = self.in_the_book.remove(&id) || self.to_be_triggered.remove(&id);
                self.arena.remove(&id);
                moved
            }
            TerminalKind::Rejected => {
                if !self.in_flight.remove(&id) {
                    return false;
                }
                if let Some(order) = self.arena.get_mut(&id) {
                    order.status = OrderStatus::RecentlyCancelled;
                    order.timestamp = ts;
                }
                self.recently_cancelled.insert(id);
                true
            }
            TerminalKind::Canceled | TerminalKind::MarginCanceled => {
                let moved = self.in_the_book.remove(&id) || self.to_be_triggered.remove(&id);
                if moved {
                    if let Some(order) = self.arena.get_mut(&id) {
                        order.status = OrderStatus::RecentlyCancelled;
                        order.timestamp = ts;
                    }
                    self.recently_cancelled.insert(id);
                }
                moved
            }
        }
    }

    // ---- intent queues (populated by QG/PE, drained by OMS) -------------

    /// Queue a newly proposed order for the OMS's monitored-drain batch
    /// *and* mark it `in_flight` immediately (§5 ordering guarantee: "an
    /// order entering in_flight is observable before its corresponding REST
    /// submission returns, because the proposer inserts into in_flight
    /// before awaiting the client call").
    pub fn queue_create(&mut self, order: Order) {
        self.submit(order.clone());
        self.to_create.insert(order.client_order_id, order);
        self.flags.to_create.set();
    }

    pub fn queue_amend(&mut self, order: Order) {
        self.to_amend.insert(order.client_order_id, order);
        self.flags.to_amend.set();
    }

    /// Drain `to_create`. Caller is responsible for clearing the flag only
    /// after the batch call completes (§4.7 monitored-drain contract).
    pub fn drain_create(&mut self) -> Vec<Order> {
        self.to_create.drain().map(|(_, o)| o).collect()
    }

    pub fn drain_amend(&mut self) -> Vec<Order> {
        self.to_amend.drain().map(|(_, o)| o).collect()
    }

    pub fn drain_cancel(&mut self) -> Vec<Order> {
        self.to_cancel.drain().map(|(_, o)| o).collect()
    }

    /// Apply an acked amend in place: the order keeps whatever lifecycle
    /// partition it was already in (normally `in_the_book`) — an amend never
    /// transitions partitions, it only updates price/size on the arena entry.
    pub fn apply_amend(&mut self, id: ClientOrderId, price: Option<f64>, size: f64, ts: u64) {
        if let Some(order) = self.arena.get_mut(&id) {
            order.price = price;
            order.size = size;
            order.timestamp = ts;
        }
    }

    pub fn to_create_snapshot(&self) -> &HashMap<ClientOrderId, Order> {
        &self.to_create
    }
    pub fn to_amend_snapshot(&self) -> &HashMap<ClientOrderId, Order> {
        &self.to_amend
    }
    pub fn to_cancel_snapshot(&self) -> &HashMap<ClientOrderId, Order> {
        &self.to_cancel
    }

    /// Move a freshly-submitted order (already in `in_flight`) back onto the
    /// `to_create` intent queue — used by the OMS when it re-proposes an
    /// order whose in-flight age exceeded the 3s lost-submission window
    /// (§4.7 step 1).
    pub fn evict_lost_in_flight(&mut self, id: ClientOrderId) -> Option<Order> {
        if !self.in_flight.remove(&id) {
            return None;
        }
        self.arena.remove(&id)
    }

    /// §4.7.1 `order_error`: removes `id` from `to_create`, `to_amend`,
    /// `to_cancel`, any `tp`/`sl` tag, and `in_flight` — never `in_the_book`.
    pub fn order_error(&mut self, id: ClientOrderId) {
        self.to_create.remove(&id);
        self.to_amend.remove(&id);
        self.to_cancel.remove(&id);
        self.tp.remove(&id);
        self.sl.remove(&id);
        if self.in_flight.remove(&id) {
            self.arena.remove(&id);
        }
    }

    /// §8 property 4: the lifecycle partitions are pairwise disjoint.
    pub fn lifecycle_partitions_disjoint(&self) -> bool {
        let sets: [&HashSet<ClientOrderId>; 4] = [
            &self.in_flight,
            &self.to_be_triggered,
            &self.in_the_book,
            &self.recently_cancelled,
        ];
        let to_cancel_ids: HashSet<ClientOrderId> = self.to_cancel.keys().copied().collect();
        for i in 0..sets.len() {
            for j in (i + 1)..sets.len() {
                if !sets[i].is_disjoint(sets[j]) {
                    return false;
                }
            }
            if !sets[i].is_disjoint(&to_cancel_ids) {
                return false;
            }
        }
        true
    }
}

//! Bog Core — Automated Market-Making Engine
//!
//! Bog quotes both sides of a perpetual-futures book and keeps resting orders
//! reconciled against venue state while managing inventory risk. The crate is
//! organized around the subsystems the quoting pipeline is built from:
//!
//! - [`book`]: Order Book Replica and Market-Data Handlers (§4.1, §4.2) —
//!   maintains the local view of the venue's order book from the public
//!   websocket feed.
//! - [`oss`]: Order State Store (§4.3) — the single source of truth for every
//!   order's lifecycle, arena-keyed by [`core::order::ClientOrderId`].
//! - [`uer`]: User Event Reducer (§4.4) — folds the private websocket's fill
//!   and status events into the order store and position.
//! - [`qg`]: Quote Generator (§4.5) — produces the desired resting-order set
//!   for a tick (`sandbox`, `plain`, `stinky` strategies).
//! - [`pe`]: Position Executor (§4.6) — take-profit and liquidation-timer
//!   planning for open inventory.
//! - [`oms`]: OMS Reconciler (§4.7) — diffs desired vs. resting orders and
//!   dispatches venue batch calls.
//! - [`venue`]: the venue client / websocket transport collaborator traits
//!   (§6) plus a deterministic in-memory implementation for tests.
//! - [`engine`]: per-symbol supervision and the shutdown sequence (§5, §4.8).
//! - [`config`]: the YAML runtime configuration document and its
//!   development/staging/production profile presets (§6, §10.3).
//! - [`numeric`]: deterministic price/size rounding helpers (§9).
//! - [`resilience`]: reconnect-with-backoff for a venue's websocket transport.
//! - [`utils`]: logging and Prometheus metrics wiring (§10.1, §10.5).

pub mod core;

pub mod book;
pub mod config;
pub mod engine;
pub mod monitoring;
pub mod numeric;
pub mod oms;
pub mod oss;
pub mod pe;
pub mod qg;
pub mod resilience;
pub mod uer;
pub mod utils;
pub mod venue;

pub use core::{ClientOrderId, Order, OrderStatus, OrderType, Side, TimeInForce};
pub use core::{Position, PositionSide, POSITION_EPS};
pub use core::{BookError, ConfigError, OssError};

pub use book::{MarketDataHandlers, OrderBookReplica};
pub use config::Config;
pub use engine::SymbolSupervisor;
pub use oms::Oms;
pub use oss::{Event, OrderStateStore};
pub use qg::QuoteGenerator;
pub use uer::UserEventReducer;
pub use venue::{VenueClient, VenueError};

pub use anyhow::{Error, Result};

/// Convenience re-exports for binaries wiring up a supervisor against a venue.
pub mod prelude {
    pub use crate::book::OrderBookReplica;
    pub use crate::config::Config;
    pub use crate::core::{ClientOrderId, Order, Position, Side};
    pub use crate::engine::SymbolSupervisor;
    pub use crate::oms::Oms;
    pub use crate::oss::OrderStateStore;
    pub use crate::pe::PositionExecutor;
    pub use crate::qg::QuoteGenerator;
    pub use crate::uer::UserEventReducer;
    pub use crate::venue::{simulated::SimulatedVenueClient, VenueClient};
    pub use crate::{Error, Result};
}

//! Venue client / websocket transport collaborator traits (§6).
//!
//! These are the external interfaces the core depends on but does not own:
//! REST batch endpoints, credential signing, and the websocket transports
//! live behind [`VenueClient`] and [`WsTransport`]. The core never
//! constructs a signature or frames a wire message itself (§6).
//!
//! Grounded on `bog-core/src/engine/traits.rs::Executor`'s `place_order` /
//! `cancel_order` shape, generalized from a synchronous zero-alloc trait to
//! an async one (this spec's collaborator boundary is a real network call,
//! not a hot-path call the teacher's const-generic `Engine` could inline);
//! [`SimulatedVenueClient`] is grounded on `execution/simulated.rs`'s
//! instant-deterministic-fill idiom, stripped of its object-pool/`ArrayQueue`
//! machinery (no longer a hot path here).

pub mod simulated;

use crate::core::order::{ClientOrderId, Order};
use std::collections::HashMap;
use std::fmt;

/// Outcome of a single order within a batch response, keyed back to the
/// `ClientOrderId` the core submitted (§4.7: "results are matched back by
/// clientOrderId").
#[derive(Debug, Clone)]
pub enum OrderResult {
    Acked { venue_order_id: String },
    Rejected { reason: String },
}

/// A decoded batch response: one [`OrderResult`] per id the batch covered.
pub type BatchResponse = HashMap<ClientOrderId, OrderResult>;

#[derive(Debug, Clone)]
pub enum VenueError {
    Transport(String),
    Auth(String),
}

impl fmt::Display for VenueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VenueError::Transport(msg) => write!(f, "venue transport error: {msg}"),
            VenueError::Auth(msg) => write!(f, "venue auth error: {msg}"),
        }
    }
}
impl std::error::Error for VenueError {}

/// Snapshot of the top of one side of the book, as returned by `getOrderbook`.
#[derive(Debug, Clone, Default)]
pub struct BookSnapshot {
    pub bids: Vec<(f64, f64)>,
    pub asks: Vec<(f64, f64)>,
    pub ts: u64,
    pub seq_id: u64,
}

/// Authoritative position snapshot, as returned by `getPosition`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionSnapshot {
    pub size: f64,
    pub entry_price: Option<f64>,
}

/// The venue client collaborator (§6): REST batch endpoints plus the
/// resync/position/account reads the market-data and OMS subsystems need.
/// Signing and request framing live on the other side of this boundary.
pub trait VenueClient: Send + Sync {
    fn batch_create(
        &self,
        orders: Vec<Order>,
    ) -> impl std::future::Future<Output = Result<BatchResponse, VenueError>> + Send;

    fn batch_amend(
        &self,
        orders: Vec<Order>,
    ) -> impl std::future::Future<Output = Result<BatchResponse, VenueError>> + Send;

    fn batch_cancel(
        &self,
        orders: Vec<Order>,
    ) -> impl std::future::Future<Output = Result<BatchResponse, VenueError>> + Send;

    fn cancel_all_orders(
        &self,
        symbol: &str,
    ) -> impl std::future::Future<Output = Result<(), VenueError>> + Send;

    /// Fire-and-forget reduce-only market order used only by the shutdown
    /// sequence (§4.8) — doesn't go through the OSS intent queues since the
    /// process is already tearing down.
    fn market_close(
        &self,
        symbol: &str,
        side: crate::core::order::Side,
        size: f64,
    ) -> impl std::future::Future<Output = Result<(), VenueError>> + Send;

    fn get_orderbook(
        &self,
        symbol: &str,
        depth: usize,
    ) -> impl std::future::Future<Output = Result<BookSnapshot, VenueError>> + Send;

    fn get_position(
        &self,
        symbol: &str,
    ) -> impl std::future::Future<Output = Result<Option<PositionSnapshot>, VenueError>> + Send;
}

/// Websocket transport collaborator (§6). Reconnection policy: on a close or
/// error the transport reports `reconnect = true`; the supervising task
/// retries after a 1s backoff (§5) and replays the snapshot.
pub trait WsTransport: Send + Sync {}

//! Order domain types: [`Side`], [`OrderType`], [`TimeInForce`], [`OrderStatus`],
//! the level-encoded [`ClientOrderId`], and [`Order`] itself.
//!
//! Grounded on `bog-core/src/core/types.rs`'s `Side`/`OrderType`/`Display`
//! conventions and `OrderId`'s bit-packing idiom (reused here for the
//! level-encoding scheme), and on the field set / equality rule of
//! `original_source/src/exchanges/common/types.py`'s `Order`.

use std::fmt;

/// Sign-bearing order side: `side * size` is signed inventory (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[repr(i8)]
pub enum Side {
    Buy = 1,
    Sell = -1,
}

impl Side {
    #[inline(always)]
    pub const fn sign(self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }

    #[inline(always)]
    pub const fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum OrderType {
    Limit,
    Market,
    StopLimit,
    TakeProfitLimit,
    StopMarket,
    TakeProfitMarket,
}

impl OrderType {
    /// Conditional order types are acknowledged into `to_be_triggered`, not
    /// directly into `in_the_book` (§4.3).
    #[inline]
    pub const fn is_conditional(self) -> bool {
        matches!(
            self,
            OrderType::StopLimit
                | OrderType::TakeProfitLimit
                | OrderType::StopMarket
                | OrderType::TakeProfitMarket
        )
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderType::Limit => "LIMIT",
            OrderType::Market => "MARKET",
            OrderType::StopLimit => "STOP_LIMIT",
            OrderType::TakeProfitLimit => "TAKE_PROFIT_LIMIT",
            OrderType::StopMarket => "STOP_MARKET",
            OrderType::TakeProfitMarket => "TAKE_PROFIT_MARKET",
        };
        write!(f, "{s}")
    }
}

/// Time in force (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TimeInForce {
    Gtc,
    Ioc,
    Fok,
    PostOnly,
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimeInForce::Gtc => "GTC",
            TimeInForce::Ioc => "IOC",
            TimeInForce::Fok => "FOK",
            TimeInForce::PostOnly => "POST_ONLY",
        };
        write!(f, "{s}")
    }
}

/// Lifecycle status, mirroring the [`crate::oss::OrderStateStore`] partition
/// an order currently lives in (§3, §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum OrderStatus {
    InFlight,
    ToBeTriggered,
    InTheBook,
    ToCancel,
    RecentlyCancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::InFlight => "IN_FLIGHT",
            OrderStatus::ToBeTriggered => "TO_BE_TRIGGERED",
            OrderStatus::InTheBook => "IN_THE_BOOK",
            OrderStatus::ToCancel => "TO_CANCEL",
            OrderStatus::RecentlyCancelled => "RECENTLY_CANCELLED",
        };
        write!(f, "{s}")
    }
}

/// Number of quoting levels representable on one side of the ladder before
/// the sequence component of a [`ClientOrderId`] would collide with the next
/// level's block. `level * LEVEL_BLOCK + sequence`.
pub const LEVEL_BLOCK: i64 = 10_000_000;

/// Level-encoded client order id (§3): `level * 10^7 + sequence`.
///
/// `level == 0` is reserved for inventory-management orders (take-profit,
/// liquidation market orders). Positive levels are asks-side / reducing-short
/// quoting slots, negative levels bids-side, by convention of the quote
/// generator that allocates them — the id itself is agnostic to which side a
/// level represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[repr(transparent)]
pub struct ClientOrderId(pub i64);

impl ClientOrderId {
    #[inline]
    pub const fn encode(level: i32, sequence: i64) -> Self {
        Self(level as i64 * LEVEL_BLOCK + sequence)
    }

    /// `decode(id) == level` such that `level * 10^7` plus the observed
    /// sequence reconstructs the id (§8 property 5).
    #[inline]
    pub const fn level(self) -> i32 {
        (self.0 / LEVEL_BLOCK) as i32
    }

    #[inline]
    pub const fn sequence(self) -> i64 {
        self.0 % LEVEL_BLOCK
    }

    #[inline]
    pub const fn is_inventory_level(self) -> bool {
        self.level() == 0
    }

    /// Opaque 128-bit two's-complement hex form for venues that require a
    /// string client id. The transport layer wraps/unwraps this; the core
    /// keeps the plain integer form everywhere else.
    pub fn to_hex128(self) -> String {
        format!("{:032x}", self.0 as i128 as u128)
    }

    pub fn from_hex128(s: &str) -> Option<Self> {
        let v = u128::from_str_radix(s, 16).ok()?;
        Some(Self(v as i128 as i64))
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An order, live or proposed.
///
/// Two orders are `==` iff `(symbol, side, order_type, time_in_force, price, size)`
/// match (§3) — `client_order_id`/`venue_order_id`/`status`/`timestamp` are
/// deliberately excluded so duplicate-intent detection (§4.7 step 1) can use
/// plain `==`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Order {
    pub symbol: String,
    pub side: Side,
    pub size: f64,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    pub price: Option<f64>,
    pub trigger_price: Option<f64>,
    pub reduce_only: bool,
    pub venue_order_id: Option<String>,
    pub client_order_id: ClientOrderId,
    pub status: OrderStatus,
    /// Venue-epoch milliseconds of the last status change.
    pub timestamp: u64,
}

impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
            && self.side == other.side
            && self.order_type == other.order_type
            && self.time_in_force == other.time_in_force
            && price_eq(self.price, other.price)
            && size_eq(self.size, other.size)
    }
}
impl Eq for Order {}

const PRICE_EPS: f64 = 1e-9;

fn price_eq(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => (x - y).abs() < PRICE_EPS,
        _ => false,
    }
}

fn size_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < PRICE_EPS
}

impl Order {
    pub fn new_limit(
        symbol: impl Into<String>,
        side: Side,
        size: f64,
        price: f64,
        time_in_force: TimeInForce,
        client_order_id: ClientOrderId,
        timestamp: u64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            size,
            order_type: OrderType::Limit,
            time_in_force,
            price: Some(price),
            trigger_price: None,
            reduce_only: false,
            venue_order_id: None,
            client_order_id,
            status: OrderStatus::InFlight,
            timestamp,
        }
    }

    pub fn new_reduce_only_market(
        symbol: impl Into<String>,
        side: Side,
        size: f64,
        client_order_id: ClientOrderId,
        timestamp: u64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            size,
            order_type: OrderType::Market,
            time_in_force: TimeInForce::Ioc,
            price: None,
            trigger_price: None,
            reduce_only: true,
            venue_order_id: None,
            client_order_id,
            status: OrderStatus::InFlight,
            timestamp,
        }
    }

    /// A cancel-only stub carrying just enough fields to submit a cancel
    /// (§4.3: "an order whose venue_order_id is unknown at cancel-time
    /// carries only enough fields to submit a cancel").
    pub fn cancel_stub(
        symbol: impl Into<String>,
        side: Side,
        size: f64,
        venue_order_id: Option<String>,
        client_order_id: ClientOrderId,
        timestamp: u64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            size,
            order_type: OrderType::Limit,
            time_in_force: TimeInForce::Gtc,
            price: None,
            trigger_price: None,
            reduce_only: false,
            venue_order_id,
            client_order_id,
            status: OrderStatus::ToCancel,
            timestamp,
        }
    }
}

//! The `"stinky"` quote generator: single level per side, skewed away from
//! inventory by a configurable risk-aversion factor.
//!
//! Grounded on `bog-core/src/strategy/inventory_based.rs`'s inventory-skew
//! idiom (price offset proportional to signed position, `risk_aversion`
//! parameter), adapted from its `rust_decimal`/`Decimal` pricing to `f64`.

use super::QuoteGenerator;
use crate::book::OrderBookReplica;
use crate::core::order::{ClientOrderId, Order, Side, TimeInForce};
use crate::core::position::Position;
use crate::numeric::rounding::{round_ceil, round_floor};

#[derive(Debug, Clone)]
pub struct StinkyParams {
    pub max_position: f64,
    pub minimum_spread_bps: f64,
    pub risk_aversion: f64,
    pub tick_size: f64,
    pub symbol: String,
}

pub struct StinkyQuoteGenerator {
    params: StinkyParams,
    bid_seq: i64,
    ask_seq: i64,
}

impl StinkyQuoteGenerator {
    pub fn new(params: StinkyParams) -> Self {
        Self {
            params,
            bid_seq: 0,
            ask_seq: 0,
        }
    }
}

impl QuoteGenerator for StinkyQuoteGenerator {
    fn generate(&mut self, book: &OrderBookReplica, position: &Position, now: u64) -> Vec<Order> {
        let Some(mid) = book.mid() else { return Vec::new() };
        if mid <= 0.0 {
            return Vec::new();
        }

        let inventory_fraction = if self.params.max_position > 0.0 {
            (position.size / self.params.max_position).clamp(-1.0, 1.0)
        } else {
            0.0
        };
        // Skew the reservation price away from the side we're already loaded on.
        let skew = -inventory_fraction * mid * (self.params.minimum_spread_bps / 10_000.0);
        let reservation_price = mid + skew;
        let half_offset = mid * (self.params.minimum_spread_bps / 10_000.0) / 2.0 * (1.0 + self.params.risk_aversion);

        let bid_budget = (self.params.max_position - position.size).max(0.0) / mid;
        let ask_budget = (self.params.max_position + position.size).max(0.0) / mid;

        let mut orders = Vec::with_capacity(2);
        if bid_budget > 0.0 {
            self.bid_seq -= 1;
            orders.push(Order::new_limit(
                self.params.symbol.clone(),
                Side::Buy,
                bid_budget,
                round_floor(reservation_price - half_offset, self.params.tick_size),
                TimeInForce::PostOnly,
                ClientOrderId::encode(-1, self.bid_seq),
                now,
            ));
        }
        if ask_budget > 0.0 {
            self.ask_seq += 1;
            orders.push(Order::new_limit(
                self.params.symbol.clone(),
                Side::Sell,
                ask_budget,
                round_ceil(reservation_price + half_offset, self.params.tick_size),
                TimeInForce::PostOnly,
                ClientOrderId::encode(1, self.ask_seq),
                now,
            ));
        }
        orders
    }
}

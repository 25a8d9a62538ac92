//! The `"plain"` quote generator: a single symmetric level per side at a
//! fixed spread, no inventory skew.
//!
//! Grounded on `bog-core/src/strategy/simple_spread.rs`'s
//! `calculate_quotes`/fixed-spread-around-mid idiom, adapted from its
//! `rust_decimal::Decimal` pricing to plain `f64` (§3 scalar domain) and from
//! one-shot `Signal` emission to QG's "desired order set per tick" contract.

use super::QuoteGenerator;
use crate::book::OrderBookReplica;
use crate::core::order::{ClientOrderId, Order, Side, TimeInForce};
use crate::core::position::Position;
use crate::numeric::rounding::{round_ceil, round_floor};

#[derive(Debug, Clone)]
pub struct PlainParams {
    pub max_position: f64,
    pub minimum_spread_bps: f64,
    pub tick_size: f64,
    pub symbol: String,
}

pub struct PlainQuoteGenerator {
    params: PlainParams,
    bid_seq: i64,
    ask_seq: i64,
}

impl PlainQuoteGenerator {
    pub fn new(params: PlainParams) -> Self {
        Self {
            params,
            bid_seq: 0,
            ask_seq: 0,
        }
    }
}

impl QuoteGenerator for PlainQuoteGenerator {
    fn generate(&mut self, book: &OrderBookReplica, position: &Position, now: u64) -> Vec<Order> {
        let Some(mid) = book.mid() else { return Vec::new() };
        if mid <= 0.0 {
            return Vec::new();
        }

        let half_offset = mid * (self.params.minimum_spread_bps / 10_000.0) / 2.0;
        let size = (self.params.max_position - position.size.abs()).max(0.0) / mid;
        if size <= 0.0 {
            return Vec::new();
        }

        self.bid_seq -= 1;
        self.ask_seq += 1;

        vec![
            Order::new_limit(
                self.params.symbol.clone(),
                Side::Buy,
                size,
                round_floor(mid - half_offset, self.params.tick_size),
                TimeInForce::PostOnly,
                ClientOrderId::encode(-1, self.bid_seq),
                now,
            ),
            Order::new_limit(
                self.params.symbol.clone(),
                Side::Sell,
                size,
                round_ceil(mid + half_offset, self.params.tick_size),
                TimeInForce::PostOnly,
                ClientOrderId::encode(1, self.ask_seq),
                now,
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_level_each_side() {
        let mut qg = PlainQuoteGenerator::new(PlainParams {
            max_position: 1000.0,
            minimum_spread_bps: 10.0,
            tick_size: 0.01,
            symbol: "BTC-PERP".into(),
        });
        let mut book = OrderBookReplica::new("BTC-PERP", 10);
        book.refresh(&[(99.0, 1.0)], &[(101.0, 1.0)], 1, 1).unwrap();
        let position = Position::flat("BTC-PERP", 0);
        let orders = qg.generate(&book, &position, 1);
        assert_eq!(orders.len(), 2);
    }
}

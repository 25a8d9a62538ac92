//! The `"sandbox"` quote generator (§4.5): geometric half-spread ladder with
//! geometric, inventory-skewed size weights.
//!
//! Grounded on `original_source/src/marketmaking/quote_generators/sandbox.py`
//! for the geometric half-spread/size-weight progression, and
//! `bog-core/src/strategy/{simple_spread,inventory_based}.rs` for the
//! `Strategy`-trait idiom of a stateless-per-tick `calculate()`/`generate()`.

use super::QuoteGenerator;
use crate::book::OrderBookReplica;
use crate::core::order::{ClientOrderId, Order, Side, TimeInForce};
use crate::core::position::Position;
use crate::numeric::rounding::{round_ceil, round_floor};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub struct SandboxParams {
    /// Total resting orders across both sides (§6 `total_orders`, must be even).
    pub total_orders: usize,
    /// USD notional budget per side (§6 `max_position`).
    pub max_position: f64,
    /// Minimum spread in bps (§6 `minimum_spread`); the ladder runs from this
    /// to `minimum_spread^1.5` across `total_orders/2` levels per side.
    pub minimum_spread_bps: f64,
    pub tick_size: f64,
    pub symbol: String,
}

/// Decay applied per level when building the geometric size-weight sequence,
/// innermost level (closest to mid) weighted heaviest. The spec names this
/// sequence "outside-in" without fixing which end is heavier; this
/// implementation resolves that ambiguity by weighting liquidity toward the
/// touch, matching how `original_source`'s sandbox generator front-loads size
/// near the inside of the ladder (see DESIGN.md Open Question notes).
const SIZE_DECAY: f64 = 0.85;

pub struct SandboxQuoteGenerator {
    params: SandboxParams,
    /// Per-level sequence counters: positive levels count up from 1, negative
    /// levels count down from -1 (§3: "sequence ... advancing away from zero").
    sequence: HashMap<i32, i64>,
}

impl SandboxQuoteGenerator {
    pub fn new(params: SandboxParams) -> Self {
        Self {
            params,
            sequence: HashMap::new(),
        }
    }

    fn next_id(&mut self, level: i32) -> ClientOrderId {
        let entry = self.sequence.entry(level).or_insert(0);
        *entry += if level >= 0 { 1 } else { -1 };
        ClientOrderId::encode(level, *entry)
    }

    /// Geometric half-spreads (bps) from `minimum_spread` to
    /// `minimum_spread^1.5` across `levels` steps.
    fn half_spreads_bps(&self, levels: usize) -> Vec<f64> {
        if levels == 0 {
            return Vec::new();
        }
        let start = self.params.minimum_spread_bps.max(1e-9);
        let end = start.powf(1.5);
        if levels == 1 {
            return vec![start];
        }
        let ratio = end / start;
        (0..levels)
            .map(|k| start * ratio.powf(k as f64 / (levels as f64 - 1.0)))
            .collect()
    }

    /// Geometric size weights, normalized so they sum to `1.0`.
    fn size_weights(&self, levels: usize) -> Vec<f64> {
        if levels == 0 {
            return Vec::new();
        }
        let raw: Vec<f64> = (0..levels).map(|k| SIZE_DECAY.powi(k as i32)).collect();
        let sum: f64 = raw.iter().sum();
        if sum <= 0.0 {
            return vec![1.0 / levels as f64; levels];
        }
        raw.into_iter().map(|w| w / sum).collect()
    }
}

impl QuoteGenerator for SandboxQuoteGenerator {
    fn generate(&mut self, book: &OrderBookReplica, position: &Position, now: u64) -> Vec<Order> {
        let Some(mid) = book.mid() else { return Vec::new() };
        let levels = self.params.total_orders / 2;
        if levels == 0 || mid <= 0.0 {
            return Vec::new();
        }

        let half_spreads = self.half_spreads_bps(levels);
        let weights = self.size_weights(levels);

        let side_budget_usd = self.params.max_position;
        let size = position.size;

        // §4.5 step 3: a long position caps the bid side's remaining budget;
        // a short position symmetrically caps the ask side's.
        let bid_budget_usd = if size > 0.0 {
            (side_budget_usd - size.abs()).max(0.0)
        } else {
            side_budget_usd
        };
        let ask_budget_usd = if size < 0.0 {
            (side_budget_usd - size.abs()).max(0.0)
        } else {
            side_budget_usd
        };

        let bid_budget_base = bid_budget_usd / mid;
        let ask_budget_base = ask_budget_usd / mid;

        let mut orders = Vec::with_capacity(self.params.total_orders);

        for (k, (&spread_bps, &weight)) in half_spreads.iter().zip(weights.iter()).enumerate() {
            let level = (k + 1) as i32;
            let spread_frac = spread_bps / 10_000.0;
            let half_offset = mid * spread_frac / 2.0;

            let bid_size = bid_budget_base * weight;
            if bid_size > 0.0 {
                let bid_price = round_floor(mid - half_offset, self.params.tick_size);
                let id = self.next_id(-level);
                orders.push(Order::new_limit(
                    self.params.symbol.clone(),
                    Side::Buy,
                    bid_size,
                    bid_price,
                    TimeInForce::PostOnly,
                    id,
                    now,
                ));
            }

            let ask_size = ask_budget_base * weight;
            if ask_size > 0.0 {
                let ask_price = round_ceil(mid + half_offset, self.params.tick_size);
                let id = self.next_id(level);
                orders.push(Order::new_limit(
                    self.params.symbol.clone(),
                    Side::Sell,
                    ask_size,
                    ask_price,
                    TimeInForce::PostOnly,
                    id,
                    now,
                ));
            }
        }

        orders
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SandboxParams {
        SandboxParams {
            total_orders: 6,
            max_position: 1000.0,
            minimum_spread_bps: 5.0,
            tick_size: 0.01,
            symbol: "BTC-PERP".into(),
        }
    }

    fn book_at_mid(mid_bid: f64, mid_ask: f64) -> OrderBookReplica {
        let mut obr = OrderBookReplica::new("BTC-PERP", 10);
        obr.refresh(&[(mid_bid, 10.0)], &[(mid_ask, 10.0)], 1, 1).unwrap();
        obr
    }

    #[test]
    fn generates_symmetric_ladder_when_flat() {
        let mut qg = SandboxQuoteGenerator::new(params());
        let position = Position::flat("BTC-PERP", 0);
        let book = book_at_mid(99.99, 100.01);
        let orders = qg.generate(&book, &position, 1);
        assert_eq!(orders.len(), 6);
        assert_eq!(orders.iter().filter(|o| o.side == Side::Buy).count(), 3);
        assert_eq!(orders.iter().filter(|o| o.side == Side::Sell).count(), 3);
    }

    #[test]
    fn long_position_shrinks_bid_budget() {
        let mut qg = SandboxQuoteGenerator::new(SandboxParams {
            max_position: 10.0,
            ..params()
        });
        let mut position = Position::flat("BTC-PERP", 0);
        position.apply_fill(Side::Buy, 100.0, 10.0, 0); // size == max_position
        let book = book_at_mid(99.99, 100.01);
        let orders = qg.generate(&book, &position, 1);
        assert!(orders.iter().all(|o| o.side != Side::Buy));
        assert!(orders.iter().any(|o| o.side == Side::Sell));
    }

    #[test]
    fn level_ids_are_level_encoded_and_advance_away_from_zero() {
        let mut qg = SandboxQuoteGenerator::new(params());
        let position = Position::flat("BTC-PERP", 0);
        let book = book_at_mid(99.99, 100.01);
        let orders = qg.generate(&book, &position, 1);
        for o in &orders {
            let level = o.client_order_id.level();
            assert_ne!(level, 0);
            if o.side == Side::Buy {
                assert!(level < 0);
            } else {
                assert!(level > 0);
            }
        }
    }

    #[test]
    fn empty_book_produces_no_orders() {
        let mut qg = SandboxQuoteGenerator::new(params());
        let position = Position::flat("BTC-PERP", 0);
        let book = OrderBookReplica::new("BTC-PERP", 10);
        assert!(qg.generate(&book, &position, 1).is_empty());
    }
}

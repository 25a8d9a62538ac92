//! Position record (§3).
//!
//! Grounded on `bog-core/src/core/types.rs::Position` for the
//! weighted-average-entry-price / flip-reset algorithm shape, stripped of the
//! `#[repr(C, align(64))]` atomic/SeqLock machinery: the spec's Position is
//! mutated only by the single-threaded UER (§5), never across threads, so
//! there is no remaining use for lock-free CAS updates here (see DESIGN.md).

use crate::core::order::Side;

/// Position size below this magnitude is treated as flat (§3: `|size| < ε`).
pub const POSITION_EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionSide {
    Long,
    Short,
}

impl From<Side> for PositionSide {
    fn from(side: Side) -> Self {
        match side {
            Side::Buy => PositionSide::Long,
            Side::Sell => PositionSide::Short,
        }
    }
}

/// `symbol, side, entry_price, size (signed), u_pnl, open_time, update_counter` (§3).
#[derive(Debug, Clone)]
pub struct Position {
    pub symbol: String,
    pub side: Option<PositionSide>,
    pub entry_price: Option<f64>,
    /// Signed size: positive long, negative short.
    pub size: f64,
    pub u_pnl: f64,
    pub open_time: u64,
    pub update_counter: u64,
}

impl Position {
    pub fn flat(symbol: impl Into<String>, now: u64) -> Self {
        Self {
            symbol: symbol.into(),
            side: None,
            entry_price: None,
            size: 0.0,
            u_pnl: 0.0,
            open_time: now,
            update_counter: 0,
        }
    }

    #[inline]
    pub fn is_flat(&self) -> bool {
        self.size.abs() < POSITION_EPS
    }

    fn reset(&mut self, now: u64) {
        self.side = None;
        self.entry_price = None;
        self.size = 0.0;
        self.open_time = now;
        self.update_counter = 0;
    }

    /// Apply a fill, updating size / entry price / open time / update_counter
    /// per the §3 rules.
    ///
    /// - Same-side fill: `entry_price` becomes the size-weighted average,
    ///   `update_counter` increments.
    /// - Flip or fresh open: `entry_price = fill_price`, `open_time` resets,
    ///   `update_counter` resets to `0` (DESIGN.md Open Question: the source's
    ///   `-=` is resolved as a hard reset, not a decrement).
    /// - Net size within ε of zero: full reset (`side = None`, `entry_price = None`).
    pub fn apply_fill(&mut self, fill_side: Side, fill_price: f64, fill_size: f64, now: u64) {
        let signed_delta = fill_side.sign() * fill_size.abs();
        let old_size = self.size;
        let new_size = old_size + signed_delta;

        if new_size.abs() < POSITION_EPS {
            self.reset(now);
            return;
        }

        let flipped = old_size.abs() < POSITION_EPS || old_size.signum() != new_size.signum();

        if flipped {
            self.entry_price = Some(fill_price);
            self.open_time = now;
            self.update_counter = 0;
        } else if old_size.signum() == signed_delta.signum() {
            // Same-side add: size-weighted average entry price.
            let old_entry = self.entry_price.unwrap_or(fill_price);
            let old_abs = old_size.abs();
            let add_abs = signed_delta.abs();
            self.entry_price = Some((old_entry * old_abs + fill_price * add_abs) / (old_abs + add_abs));
            self.update_counter += 1;
        } else {
            // Partial close on the same side, entry price unchanged.
            self.update_counter += 1;
        }

        self.size = new_size;
        self.side = Some(if new_size > 0.0 {
            PositionSide::Long
        } else {
            PositionSide::Short
        });
    }

    /// Reconcile against an authoritative account/position snapshot (§4.4).
    /// Replaces local state wholesale when it diverges; resets to flat when
    /// the snapshot reports no position for this symbol.
    pub fn reconcile_from_snapshot(
        &mut self,
        snapshot_size: f64,
        snapshot_entry_price: Option<f64>,
        now: u64,
    ) {
        if snapshot_size.abs() < POSITION_EPS {
            self.reset(now);
            return;
        }
        if (snapshot_size - self.size).abs() >= POSITION_EPS {
            self.size = snapshot_size;
            self.entry_price = snapshot_entry_price.or(self.entry_price);
            self.side = Some(if snapshot_size > 0.0 {
                PositionSide::Long
            } else {
                PositionSide::Short
            });
        }
    }

    /// Unrealized PnL given a mark price, signed with position direction.
    pub fn update_upnl(&mut self, mark_price: f64) {
        self.u_pnl = match self.entry_price {
            Some(entry) => self.size * (mark_price - entry),
            None => 0.0,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_open_sets_entry_price_and_resets_counter() {
        let mut p = Position::flat("BTC-PERP", 0);
        p.apply_fill(Side::Buy, 100.0, 1.0, 10);
        assert_eq!(p.size, 1.0);
        assert_eq!(p.entry_price, Some(100.0));
        assert_eq!(p.update_counter, 0);
        assert_eq!(p.open_time, 10);
    }

    #[test]
    fn same_side_add_is_weighted_average_and_increments_counter() {
        let mut p = Position::flat("BTC-PERP", 0);
        p.apply_fill(Side::Buy, 100.0, 1.0, 10);
        p.apply_fill(Side::Buy, 110.0, 1.0, 20);
        assert!((p.entry_price.unwrap() - 105.0).abs() < 1e-9);
        assert_eq!(p.update_counter, 1);
        assert_eq!(p.open_time, 10, "open_time unchanged on same-side add");
    }

    #[test]
    fn flip_resets_entry_price_open_time_and_counter() {
        let mut p = Position::flat("BTC-PERP", 0);
        p.apply_fill(Side::Buy, 100.0, 1.0, 10);
        p.apply_fill(Side::Buy, 110.0, 1.0, 20);
        p.apply_fill(Side::Sell, 120.0, 3.0, 30); // net -1.0, flips short
        assert_eq!(p.side, Some(PositionSide::Short));
        assert!((p.size + 1.0).abs() < 1e-9);
        assert_eq!(p.entry_price, Some(120.0));
        assert_eq!(p.update_counter, 0);
        assert_eq!(p.open_time, 30);
    }

    #[test]
    fn net_zero_sequence_resets_to_flat() {
        let mut p = Position::flat("BTC-PERP", 0);
        p.apply_fill(Side::Buy, 100.0, 1.0, 10);
        p.apply_fill(Side::Sell, 101.0, 1.0, 20);
        assert!(p.is_flat());
        assert_eq!(p.side, None);
        assert_eq!(p.entry_price, None);
    }

    #[test]
    fn reconcile_resets_when_snapshot_reports_no_position() {
        let mut p = Position::flat("BTC-PERP", 0);
        p.apply_fill(Side::Buy, 100.0, 1.0, 10);
        p.reconcile_from_snapshot(0.0, None, 99);
        assert!(p.is_flat());
        assert_eq!(p.open_time, 99);
    }
}

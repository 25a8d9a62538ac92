//! Fuzz target for `Position::apply_fill`/`update_upnl` under extreme inputs —
//! neither should ever panic, even on NaN/infinite prices or sizes.

#![no_main]

use bog_core::core::order::Side;
use bog_core::core::Position;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 25 {
        return;
    }

    let fill_price = f64::from_le_bytes(data[0..8].try_into().unwrap());
    let fill_size = f64::from_le_bytes(data[8..16].try_into().unwrap());
    let mark_price = f64::from_le_bytes(data[16..24].try_into().unwrap());
    let side = if data[24] & 1 == 0 { Side::Buy } else { Side::Sell };

    let mut position = Position::flat("BTC-PERP", 0);
    position.apply_fill(side, fill_price, fill_size, 0);
    position.update_upnl(mark_price);

    if fill_size.is_finite() && fill_price.is_finite() && mark_price.is_finite() {
        assert!(position.size.is_finite(), "position size went non-finite: {}", position.size);
    }
});

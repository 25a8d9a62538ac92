//! Fuzz target for the tick-size/sig-fig rounding helpers used by every
//! quote generator to snap prices and sizes onto the venue's grid.

#![no_main]

use bog_core::numeric::rounding::{hl_round_ceil, hl_round_floor, round_ceil, round_floor, round_nearest};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 18 {
        return;
    }

    let value = f64::from_le_bytes(data[0..8].try_into().unwrap());
    let step = f64::from_le_bytes(data[8..16].try_into().unwrap());

    // None of these should ever panic, regardless of NaN/infinity/negative step.
    let floor = round_floor(value, step);
    let ceil = round_ceil(value, step);
    let nearest = round_nearest(value, step);

    if value.is_finite() && step > 0.0 {
        assert!(floor <= value + step, "round_floor overshot: {value} / {step} -> {floor}");
        assert!(ceil >= value - step, "round_ceil undershot: {value} / {step} -> {ceil}");
        assert!(nearest.is_finite());
    }

    let sig_figs = (data[16] % 10 + 1) as u32;
    let max_decimals = (data[17] % 8) as u32;

    let hl_floor = hl_round_floor(value, sig_figs, max_decimals);
    let hl_ceil = hl_round_ceil(value, sig_figs, max_decimals);
    assert!(hl_floor.is_finite());
    assert!(hl_ceil.is_finite());
});

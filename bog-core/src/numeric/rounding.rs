//! Step-size and sig-fig rounding, ported from
//! `original_source/src/tools/rounding.py`.

/// Round `value` down to the nearest multiple of `step` (e.g. `tick_size`/`lot_size`).
#[inline]
pub fn round_floor(value: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return value;
    }
    (value / step).floor() * step
}

/// Round `value` up to the nearest multiple of `step`.
#[inline]
pub fn round_ceil(value: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return value;
    }
    (value / step).ceil() * step
}

/// Round `value` to the nearest multiple of `step`, ties away from zero.
#[inline]
pub fn round_nearest(value: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return value;
    }
    (value / step).round() * step
}

/// Round `value` down (or up, when `ceil`) such that the result has at most
/// `sig_figs` significant figures AND at most `max_decimals` decimal places —
/// the stricter of the two constraints wins.
///
/// This is the `hl_round_*` family (named for the venue whose tick rules
/// combine both constraints): e.g. with `sig_figs = 5` and `max_decimals = 1`,
/// `123456.78` floors to `123450.0` from the sig-fig rule and `123456.7` from
/// the decimals rule — the function returns whichever is *less* precise
/// (`123450.0`), since both constraints must hold simultaneously.
pub fn hl_round_floor(value: f64, sig_figs: u32, max_decimals: u32) -> f64 {
    hl_round(value, sig_figs, max_decimals, false)
}

pub fn hl_round_ceil(value: f64, sig_figs: u32, max_decimals: u32) -> f64 {
    hl_round(value, sig_figs, max_decimals, true)
}

fn hl_round(value: f64, sig_figs: u32, max_decimals: u32, ceil: bool) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return 0.0;
    }
    let sign = value.signum();
    let abs = value.abs();

    // Decimal step implied by sig_figs significant figures.
    let magnitude = abs.log10().floor() as i32;
    let sig_fig_decimals = sig_figs as i32 - 1 - magnitude;

    // The binding constraint is whichever allows *fewer* decimals (coarser
    // step); `decimals` may go negative (e.g. sig-figs forcing rounding to
    // the nearest ten or hundred), so it is not clamped to zero.
    let decimals = sig_fig_decimals.min(max_decimals as i32);
    let step = 10f64.powi(-decimals);

    let rounded = if ceil {
        (abs / step).ceil() * step
    } else {
        (abs / step).floor() * step
    };

    sign * rounded
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn round_floor_snaps_down_to_tick() {
        assert_relative_eq!(round_floor(100.37, 0.1), 100.3, epsilon = 1e-9);
        assert_relative_eq!(round_floor(100.3, 0.1), 100.3, epsilon = 1e-9);
    }

    #[test]
    fn round_ceil_snaps_up_to_tick() {
        assert_relative_eq!(round_ceil(100.31, 0.1), 100.4, epsilon = 1e-9);
    }

    #[test]
    fn round_nearest_rounds_to_closest_tick() {
        assert_relative_eq!(round_nearest(100.34, 0.1), 100.3, epsilon = 1e-9);
        assert_relative_eq!(round_nearest(100.36, 0.1), 100.4, epsilon = 1e-9);
    }

    #[test]
    fn hl_round_respects_decimals_when_it_is_the_binding_constraint() {
        // 5 sig figs on 123456.78 would allow 0 decimals (123450), but max_decimals=1
        // only matters when it's *stricter* than the sig-fig step - here sig-fig wins.
        let floored = hl_round_floor(123456.78, 5, 1);
        assert_relative_eq!(floored, 123450.0, epsilon = 1e-6);
    }

    #[test]
    fn hl_round_respects_sig_figs_when_it_is_the_binding_constraint() {
        // Small value: 3 sig figs on 0.012345 -> step 1e-4 (0.0123), but
        // max_decimals=2 is stricter (step 1e-2) and wins.
        let floored = hl_round_floor(0.012345, 3, 2);
        assert_relative_eq!(floored, 0.01, epsilon = 1e-9);
    }

    #[test]
    fn hl_round_handles_negative_values_symmetrically() {
        assert_relative_eq!(hl_round_floor(-100.37, 5, 1), -100.3, epsilon = 1e-9);
        assert_relative_eq!(hl_round_ceil(-100.37, 5, 1), -100.4, epsilon = 1e-9);
    }

    #[test]
    fn hl_round_zero_is_zero() {
        assert_eq!(hl_round_floor(0.0, 5, 2), 0.0);
    }
}

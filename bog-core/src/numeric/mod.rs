//! Deterministic numeric rounding helpers (§9 Design Notes).
//!
//! Two families, grounded directly on `original_source/src/tools/rounding.py`:
//! step-size rounding (`round_floor`/`round_ceil`/`round_nearest` to multiples
//! of a tick/lot size) and sig-fig-plus-decimals rounding
//! (`hl_round_floor`/`hl_round_ceil`), translated from the numpy/numba
//! formulation to plain `f64` functions.

pub mod rounding;

pub use rounding::{hl_round_ceil, hl_round_floor, round_ceil, round_floor, round_nearest};

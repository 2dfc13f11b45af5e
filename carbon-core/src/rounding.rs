//! Rounding helpers for emission figures.
//!
//! Estimators report kilograms of CO₂ with whatever precision they like;
//! results are normalized to two decimal places before they reach the
//! session so every renderer sees the same numbers.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places kept on every emission figure.
pub const FIGURE_DECIMAL_PLACES: u32 = 2;

/// Rounds a decimal value to two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use carbon_core::rounding::round_half_up;
///
/// assert_eq!(round_half_up(dec!(5.204)), dec!(5.20));
/// assert_eq!(round_half_up(dec!(5.205)), dec!(5.21));
/// assert_eq!(round_half_up(dec!(-0.005)), dec!(-0.01));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(
        FIGURE_DECIMAL_PLACES,
        RoundingStrategy::MidpointAwayFromZero,
    )
}

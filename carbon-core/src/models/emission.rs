use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rounding::round_half_up;

/// A figure in an [`EmissionResult`] was below zero.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{figure} must not be negative (got {value})")]
pub struct NegativeFigure {
    pub figure: String,
    pub value: Decimal,
}

/// One category's share of the estimate, in kg CO₂.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryContribution {
    pub name: String,
    pub value: Decimal,
}

impl CategoryContribution {
    pub fn new(
        name: impl Into<String>,
        value: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Estimated emissions in kg CO₂ at three granularities plus a
/// per-category breakdown.
///
/// The breakdown is reported by the estimator independently of the totals
/// and is not required to add up to `daily` (or anything else). Callers
/// must not assume additive consistency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionResult {
    pub daily: Decimal,
    pub weekly: Decimal,
    pub monthly: Decimal,
    #[serde(default)]
    pub breakdown: Vec<CategoryContribution>,
}

impl EmissionResult {
    /// Checks that no figure is negative.
    pub fn validate(&self) -> Result<(), NegativeFigure> {
        let totals = [
            ("daily", self.daily),
            ("weekly", self.weekly),
            ("monthly", self.monthly),
        ];
        for (figure, value) in totals {
            if value < Decimal::ZERO {
                return Err(NegativeFigure {
                    figure: figure.to_string(),
                    value,
                });
            }
        }
        for c in &self.breakdown {
            if c.value < Decimal::ZERO {
                return Err(NegativeFigure {
                    figure: format!("breakdown '{}'", c.name),
                    value: c.value,
                });
            }
        }
        Ok(())
    }

    /// Returns a copy with every figure rounded half-up to two decimals.
    pub fn normalized(mut self) -> Self {
        self.daily = round_half_up(self.daily);
        self.weekly = round_half_up(self.weekly);
        self.monthly = round_half_up(self.monthly);
        for c in &mut self.breakdown {
            c.value = round_half_up(c.value);
        }
        self
    }

    /// Sum of the breakdown values, or `None` if it overflows.
    /// Informational only; see the type docs.
    pub fn breakdown_total(&self) -> Option<Decimal> {
        self.breakdown
            .iter()
            .try_fold(Decimal::ZERO, |total, c| total.checked_add(c.value))
    }
}

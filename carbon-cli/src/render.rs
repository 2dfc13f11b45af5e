//! Plain-text rendering of wizard views and results.
//!
//! Everything here is a pure function from core types to `String`, so the
//! interactive loop only decides *when* to print.

use std::fmt::Write as _;

use carbon_core::{EmissionResult, FieldDefinition, Phase, WizardView};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

pub const BAR_WIDTH: usize = 20;

const FAILED_HINT: &str = "Press Enter to try again, or :reset to start over.";

/// One of the three headline figures, with its gauge scaling.
///
/// Gauges are for display only: daily kg are shown ×10, weekly ×2 and
/// monthly ÷2 as a percentage, clamped to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Daily,
    Weekly,
    Monthly,
}

impl Metric {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
        }
    }

    fn scale(&self) -> Decimal {
        match self {
            Self::Daily => Decimal::TEN,
            Self::Weekly => Decimal::TWO,
            Self::Monthly => Decimal::new(5, 1),
        }
    }

    pub fn value(
        &self,
        result: &EmissionResult,
    ) -> Decimal {
        match self {
            Self::Daily => result.daily,
            Self::Weekly => result.weekly,
            Self::Monthly => result.monthly,
        }
    }

    /// Gauge fill in whole percent, `0..=100`. Figures too large to scale
    /// fill the gauge.
    pub fn gauge_percent(
        &self,
        value: Decimal,
    ) -> u8 {
        value.checked_mul(self.scale()).map_or(100, |scaled| {
            scaled
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
                .to_u8()
                .unwrap_or(0)
        })
    }
}

/// `[#####---------------]` for `fraction` of `width` cells.
pub fn bar(
    fraction: f64,
    width: usize,
) -> String {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (fraction * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

fn figure(value: Decimal) -> String {
    format!("{value:.2}")
}

/// Header for the current step: title, position and progress bar, plus the
/// pending notice if there is one.
pub fn render_step(view: &WizardView<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\nStep {} of {}: {}",
        view.step_index + 1,
        view.step_count,
        view.step.title
    );
    let _ = writeln!(
        out,
        "{} {:>3.0}%",
        bar(view.progress, BAR_WIDTH),
        view.progress * 100.0
    );
    if let Some(notice) = &view.notice {
        let _ = writeln!(out, "{}", render_notice(notice));
    }
    out
}

pub fn render_notice(notice: &str) -> String {
    format!("! {notice}")
}

/// Prompt for one field. Choice fields list their options, numbered from 1.
/// The current answer, if any, is shown so Enter can keep it.
pub fn render_field_prompt(
    field: &FieldDefinition,
    current: Option<&str>,
) -> String {
    let mut out = String::new();
    let _ = write!(out, "{}", field.label);
    if !field.placeholder.is_empty() {
        let _ = write!(out, " ({})", field.placeholder);
    }
    out.push('\n');

    for (i, choice) in field.choices.iter().enumerate() {
        let marker = if current == Some(choice.value.as_str()) {
            "*"
        } else {
            " "
        };
        let _ = writeln!(out, " {marker}{}) {}", i + 1, choice.label);
    }

    match current.filter(|v| !v.trim().is_empty()) {
        Some(value) => {
            let _ = write!(out, "[{value}] > ");
        }
        None => out.push_str("> "),
    }
    out
}

/// One-line status for phases that have no step prompt.
pub fn render_phase_hint(phase: Phase) -> Option<&'static str> {
    match phase {
        Phase::Collecting { .. } => None,
        Phase::Submitting => Some("Calculating your footprint... (type :reset to cancel)"),
        Phase::Failed => Some(FAILED_HINT),
        Phase::Completed => Some("Press Enter to calculate again, or :quit to leave."),
    }
}

/// Headline figures with their gauges, then the per-category breakdown as
/// bars relative to the largest category.
pub fn render_result(result: &EmissionResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nYour Carbon Footprint");

    for metric in [Metric::Daily, Metric::Weekly, Metric::Monthly] {
        let value = metric.value(result);
        let percent = metric.gauge_percent(value);
        let _ = writeln!(
            out,
            "  {:<8}{:>9} kg CO2  {} {:>3}%",
            metric.label(),
            figure(value),
            bar(f64::from(percent) / 100.0, BAR_WIDTH),
            percent
        );
    }

    if result.breakdown.is_empty() {
        return out;
    }

    let _ = writeln!(out, "\nBreakdown (kg CO2)");
    let largest = result
        .breakdown
        .iter()
        .map(|c| c.value)
        .max()
        .unwrap_or(Decimal::ZERO);
    let name_width = result
        .breakdown
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(0);

    for category in &result.breakdown {
        let fraction = if largest.is_zero() {
            0.0
        } else {
            (category.value / largest).to_f64().unwrap_or(0.0)
        };
        let _ = writeln!(
            out,
            "  {:<name_width$}  {:>7}  {}",
            category.name,
            figure(category.value),
            bar(fraction, BAR_WIDTH),
        );
    }
    out
}

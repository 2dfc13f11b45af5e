//! Decoding `generateContent` responses into an [`EmissionResult`].
//!
//! The model's answer arrives as free text inside the first candidate. It
//! is expected to be a JSON object, but models like to wrap JSON in
//! Markdown code fences, so those are stripped first.

use std::sync::LazyLock;

use carbon_core::{CategoryContribution, EmissionResult, EstimationError};
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").expect("code fence pattern is valid")
});

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireEstimate {
    daily: f64,
    weekly: f64,
    monthly: f64,
    #[serde(default)]
    breakdown: Vec<WireCategory>,
}

#[derive(Debug, Deserialize)]
struct WireCategory {
    #[serde(alias = "categoryName", alias = "category")]
    name: String,
    value: f64,
}

/// Extracts the concatenated text parts of the first candidate.
///
/// # Errors
/// [`EstimationError::MalformedResponse`] when the body is not a
/// `generateContent` response or carries no text.
pub fn candidate_text(body: &str) -> Result<String, EstimationError> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| EstimationError::MalformedResponse(format!("response body: {e}")))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(EstimationError::MalformedResponse(
            "response contained no candidate text".to_string(),
        ));
    }
    Ok(text)
}

/// Removes a surrounding Markdown code fence, if there is one.
pub fn strip_code_fence(text: &str) -> &str {
    match CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => text.trim(),
    }
}

/// Parses the model's JSON answer, rejecting negative figures and rounding
/// every figure to two decimals.
///
/// # Errors
/// [`EstimationError::MalformedResponse`] on invalid JSON, missing keys,
/// non-finite numbers or negative values.
pub fn parse_emission_json(text: &str) -> Result<EmissionResult, EstimationError> {
    let wire: WireEstimate = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| EstimationError::MalformedResponse(format!("estimate JSON: {e}")))?;

    let result = EmissionResult {
        daily: to_decimal("daily", wire.daily)?,
        weekly: to_decimal("weekly", wire.weekly)?,
        monthly: to_decimal("monthly", wire.monthly)?,
        breakdown: wire
            .breakdown
            .into_iter()
            .map(|c| -> Result<CategoryContribution, EstimationError> {
                let value = to_decimal(&c.name, c.value)?;
                Ok(CategoryContribution::new(c.name, value))
            })
            .collect::<Result<Vec<_>, _>>()?,
    };

    result
        .validate()
        .map_err(|e| EstimationError::MalformedResponse(e.to_string()))?;
    Ok(result.normalized())
}

fn to_decimal(
    figure: &str,
    value: f64,
) -> Result<Decimal, EstimationError> {
    Decimal::from_f64(value).ok_or_else(|| {
        EstimationError::MalformedResponse(format!("{figure} is not a representable number"))
    })
}

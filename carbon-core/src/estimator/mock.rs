use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;

use super::factory::{EstimatorConfig, EstimatorFactory};
use super::traits::{EstimationError, Estimator};
use crate::models::{AnswerMap, CategoryContribution, EmissionResult};

/// Deterministic local estimator.
///
/// Ignores the answers and returns a fixed result (or a fixed failure),
/// optionally after a delay. Used when no real backend is configured and in
/// tests that need predictable estimator behaviour.
#[derive(Debug, Clone)]
pub struct MockEstimator {
    result: EmissionResult,
    failure: Option<String>,
    latency: Duration,
}

impl MockEstimator {
    /// A mock returning the placeholder figures: 5.2 kg/day, 36.4 kg/week,
    /// 156 kg/month, split across transport, electricity and diet.
    pub fn new() -> Self {
        Self::with_result(placeholder_result())
    }

    pub fn with_result(result: EmissionResult) -> Self {
        Self {
            result,
            failure: None,
            latency: Duration::ZERO,
        }
    }

    /// A mock whose every call fails with [`EstimationError::Upstream`].
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new()
        }
    }

    /// The result every successful call returns.
    pub fn result(&self) -> &EmissionResult {
        &self.result
    }

    pub fn with_latency(
        mut self,
        latency: Duration,
    ) -> Self {
        self.latency = latency;
        self
    }
}

impl Default for MockEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Estimator for MockEstimator {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn compute(
        &self,
        answers: &AnswerMap,
    ) -> Result<EmissionResult, EstimationError> {
        debug!(
            answers = answers.len(),
            latency_ms = self.latency.as_millis() as u64,
            "mock estimate requested"
        );
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match &self.failure {
            Some(message) => Err(EstimationError::Upstream(message.clone())),
            None => Ok(self.result.clone()),
        }
    }
}

fn placeholder_result() -> EmissionResult {
    EmissionResult {
        daily: Decimal::new(52, 1),
        weekly: Decimal::new(364, 1),
        monthly: Decimal::new(156, 0),
        breakdown: vec![
            CategoryContribution::new("Transport", Decimal::new(25, 1)),
            CategoryContribution::new("Electricity", Decimal::new(17, 1)),
            CategoryContribution::new("Diet", Decimal::new(10, 1)),
        ],
    }
}

/// [`EstimatorFactory`] for the `"mock"` backend.
pub struct MockEstimatorFactory;

#[async_trait]
impl EstimatorFactory for MockEstimatorFactory {
    fn backend_name(&self) -> &'static str {
        "mock"
    }

    async fn create(
        &self,
        _config: &EstimatorConfig,
    ) -> Result<Box<dyn Estimator>, EstimationError> {
        Ok(Box::new(MockEstimator::new()))
    }
}

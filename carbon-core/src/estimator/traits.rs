use async_trait::async_trait;
use thiserror::Error;

use crate::models::{AnswerMap, EmissionResult};

/// Why an estimate could not be produced.
///
/// All variants are recoverable at the session level: the session moves to
/// `Failed` and the user can resubmit or reset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EstimationError {
    #[error("no credential configured for the '{backend}' estimator")]
    MissingCredential { backend: String },

    #[error("{0}")]
    Upstream(String),

    #[error("malformed estimator response: {0}")]
    MalformedResponse(String),

    #[error("estimator did not respond within {seconds}s")]
    Timeout { seconds: u64 },

    #[error("estimator configuration error: {0}")]
    Configuration(String),

    #[error("could not reach estimator: {0}")]
    Transport(String),
}

/// Produces an emission estimate from a complete answer map.
///
/// Implementations may take arbitrarily long; callers enforce their own
/// timeout. A returned result should already satisfy
/// [`EmissionResult::validate`].
#[async_trait]
pub trait Estimator: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    async fn compute(
        &self,
        answers: &AnswerMap,
    ) -> Result<EmissionResult, EstimationError>;
}

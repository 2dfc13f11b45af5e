use async_trait::async_trait;
use carbon_core::{EstimationError, Estimator, EstimatorConfig, EstimatorFactory};
use tracing::info;

use crate::estimator::{DEFAULT_ENDPOINT, DEFAULT_MODEL, GeminiEstimator};

/// [`EstimatorFactory`] for the `"gemini"` backend.
pub struct GeminiEstimatorFactory;

#[async_trait]
impl EstimatorFactory for GeminiEstimatorFactory {
    fn backend_name(&self) -> &'static str {
        "gemini"
    }

    async fn create(
        &self,
        config: &EstimatorConfig,
    ) -> Result<Box<dyn Estimator>, EstimationError> {
        let api_key = config
            .credential()
            .ok_or_else(|| EstimationError::MissingCredential {
                backend: self.backend_name().to_string(),
            })?;

        let model = non_blank(config.model.as_deref()).unwrap_or(DEFAULT_MODEL);
        let endpoint = non_blank(config.endpoint.as_deref()).unwrap_or(DEFAULT_ENDPOINT);

        let estimator = GeminiEstimator::new(api_key, model, endpoint, config.timeout())?;
        info!(model = estimator.model(), "gemini estimator ready");
        Ok(Box::new(estimator))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn config(credential: Option<&str>) -> EstimatorConfig {
        EstimatorConfig {
            backend: "gemini".to_string(),
            credential: credential.map(str::to_string),
            ..EstimatorConfig::default()
        }
    }

    #[tokio::test]
    async fn missing_credential_is_reported_at_creation() {
        let result = GeminiEstimatorFactory.create(&config(None)).await;

        assert_eq!(
            result.err(),
            Some(EstimationError::MissingCredential {
                backend: "gemini".to_string()
            })
        );
    }

    #[tokio::test]
    async fn blank_credential_counts_as_missing() {
        let result = GeminiEstimatorFactory.create(&config(Some("   "))).await;

        assert!(matches!(
            result,
            Err(EstimationError::MissingCredential { .. })
        ));
    }

    #[tokio::test]
    async fn credential_builds_gemini_estimator() {
        let estimator = GeminiEstimatorFactory
            .create(&config(Some("key")))
            .await
            .unwrap();

        assert_eq!(estimator.name(), "gemini");
    }

    #[tokio::test]
    async fn registry_dispatches_to_gemini() {
        let mut registry = carbon_core::EstimatorRegistry::new();
        registry.register(Box::new(GeminiEstimatorFactory));
        registry.register(Box::new(carbon_core::MockEstimatorFactory));

        let estimator = registry.create(&config(Some("key"))).await.unwrap();

        assert_eq!(registry.available_backends(), vec!["gemini", "mock"]);
        assert_eq!(estimator.name(), "gemini");
    }

    #[test]
    fn blank_overrides_fall_back_to_defaults() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(Some(" flash ")), Some("flash"));
        assert_eq!(non_blank(None), None);
    }
}

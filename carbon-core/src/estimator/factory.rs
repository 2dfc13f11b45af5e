use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::traits::{EstimationError, Estimator};

/// Default upper bound on a single estimator call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Backend-agnostic estimator configuration.
///
/// `backend` must match the [`EstimatorFactory::backend_name`] of a
/// registered factory. The remaining values are passed through to that
/// factory; which of them matter is backend-specific.
///
/// | backend  | credential | endpoint / model                         |
/// |----------|------------|------------------------------------------|
/// | `mock`   | ignored    | ignored                                  |
/// | `gemini` | required   | optional, defaults to the public API     |
///
/// The credential is always injected (config file, environment, flag) and
/// is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Lowercase identifier matching a registered factory (e.g. `"mock"`).
    pub backend: String,
    pub credential: Option<String>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: u64,
}

impl EstimatorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The credential, if one is set and not blank.
    pub fn credential(&self) -> Option<&str> {
        self.credential
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            backend: "mock".to_string(),
            credential: None,
            endpoint: None,
            model: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for EstimatorConfig {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("EstimatorConfig")
            .field("backend", &self.backend)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// One implementation per estimator backend. Each backend exports a unit
/// struct implementing this trait, registered with an
/// [`EstimatorRegistry`] at startup.
#[async_trait]
pub trait EstimatorFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Build a ready-to-use estimator. Missing credentials must be reported
    /// here as [`EstimationError::MissingCredential`], not deferred to the
    /// first call.
    async fn create(
        &self,
        config: &EstimatorConfig,
    ) -> Result<Box<dyn Estimator>, EstimationError>;
}

/// Registry of [`EstimatorFactory`] instances, keyed by backend name.
pub struct EstimatorRegistry {
    factories: HashMap<&'static str, Box<dyn EstimatorFactory>>,
}

impl EstimatorRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory, replacing any previous factory with the
    /// same name.
    pub fn register(
        &mut self,
        factory: Box<dyn EstimatorFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch to the factory matching `config.backend`.
    ///
    /// # Errors
    /// * [`EstimationError::Configuration`] when no factory is registered
    ///   under that name.
    /// * Whatever the chosen factory returns.
    pub async fn create(
        &self,
        config: &EstimatorConfig,
    ) -> Result<Box<dyn Estimator>, EstimationError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                EstimationError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        factory.create(config).await
    }
}

impl Default for EstimatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

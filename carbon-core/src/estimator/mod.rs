//! The boundary to whatever turns answers into emission figures.
//!
//! The wizard only knows the [`Estimator`] trait. Concrete backends live in
//! their own crates and are made available through an
//! [`EstimatorRegistry`], selected at runtime by [`EstimatorConfig::backend`].

pub mod factory;
pub mod mock;
pub mod traits;

pub use factory::{DEFAULT_TIMEOUT_SECS, EstimatorConfig, EstimatorFactory, EstimatorRegistry};
pub use mock::{MockEstimator, MockEstimatorFactory};
pub use traits::{EstimationError, Estimator};

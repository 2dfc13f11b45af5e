//! Estimator backend that asks a Gemini `generateContent` endpoint for an
//! emission estimate and parses the JSON it returns.
//!
//! ```rust,no_run
//! use carbon_core::EstimatorRegistry;
//! use carbon_estimator_gemini::GeminiEstimatorFactory;
//!
//! let mut registry = EstimatorRegistry::new();
//! registry.register(Box::new(GeminiEstimatorFactory));
//! ```

mod estimator;
mod factory;
pub mod prompt;
pub mod response;

pub use estimator::{DEFAULT_ENDPOINT, DEFAULT_MODEL, GeminiEstimator};
pub use factory::GeminiEstimatorFactory;

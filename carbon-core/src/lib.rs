pub mod estimator;
pub mod models;
pub mod rounding;
pub mod schema;
pub mod wizard;

pub use estimator::{
    DEFAULT_TIMEOUT_SECS, EstimationError, Estimator, EstimatorConfig, EstimatorFactory,
    EstimatorRegistry, MockEstimator, MockEstimatorFactory,
};
pub use models::*;
pub use schema::{QuestionSet, SchemaError, StepSchema};
pub use wizard::{
    Completion, Controller, ControllerError, EstimateRequest, Phase, ResultState,
    SubmitOutcome, Transition, ValidationError, WizardError, WizardEvent, WizardRuntime,
    WizardSession, WizardState, WizardView, run_estimate,
};

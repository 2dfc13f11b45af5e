//! Session state, the step-submission state machine, and the async
//! runtime that connects it to an [`Estimator`](crate::Estimator).

mod controller;
mod runtime;
mod state;

pub use controller::{
    Completion, Controller, ControllerError, EstimateRequest, Phase, SubmitOutcome, Transition,
    ValidationError, WizardEvent, WizardView,
};
pub use runtime::{WizardRuntime, run_estimate};
pub use state::{ResultState, WizardError, WizardSession, WizardState};

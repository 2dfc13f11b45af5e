//! Step-submission state machine.
//!
//! ```text
//! Collecting(0) -> Collecting(1) -> ... -> Collecting(last) -> Submitting
//!                                                              |-> Completed
//!                                                              '-> Failed
//! ```
//!
//! `Completed` is left only through a reset. `Failed` keeps the answers so
//! the final step can simply be submitted again.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::state::{ResultState, WizardError, WizardState};
use crate::estimator::EstimationError;
use crate::models::{AnswerMap, EmissionResult, StepDefinition};
use crate::schema::{SchemaError, StepSchema};

/// A submitted step had unanswered fields. The session is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "please fill all fields on step {} ({step_title}); missing: {}",
    .step_index + 1,
    .missing.join(", ")
)]
pub struct ValidationError {
    pub step_index: usize,
    pub step_title: String,
    /// Names of the unanswered fields, in step order.
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("an estimate is already being computed for this session")]
    AlreadySubmitting,

    #[error("the estimate is complete; reset to start over")]
    Completed,

    #[error("the estimate failed; submit again to retry or reset to start over")]
    Failed,

    #[error(transparent)]
    Wizard(#[from] WizardError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Where the session is, as seen from the outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Collecting { step_index: usize },
    Submitting,
    Completed,
    Failed,
}

/// Work handed to an estimator when the last step is submitted.
///
/// `generation` identifies the session the request belongs to; a completion
/// carrying an older generation is discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstimateRequest {
    pub generation: u64,
    pub answers: AnswerMap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Advanced { step_index: usize },
    Submitting(EstimateRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Stale,
}

/// Everything a renderer can send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEvent {
    FieldChanged { name: String, value: String },
    Next,
    Back,
    ResetRequested,
    EstimateFinished {
        generation: u64,
        outcome: Result<EmissionResult, EstimationError>,
    },
}

/// What an event did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    AnswerRecorded,
    Advanced { step_index: usize },
    Retreated { step_index: usize },
    Submitting(EstimateRequest),
    Reset,
    EstimateApplied,
    StaleEstimateDiscarded,
}

/// Renderer-facing snapshot of the session.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardView<'a> {
    pub step_index: usize,
    pub step_count: usize,
    pub step: &'a StepDefinition,
    pub answers: Vec<(&'a str, Option<&'a str>)>,
    pub progress: f64,
    pub phase: Phase,
    pub result: Option<&'a EmissionResult>,
    /// Pending validation or estimation message for the user.
    pub notice: Option<String>,
    pub can_go_back: bool,
    pub is_last_step: bool,
}

#[derive(Debug, Clone)]
pub struct Controller {
    state: WizardState,
    generation: u64,
    validation: Option<ValidationError>,
}

impl Controller {
    pub fn new(schema: Arc<StepSchema>) -> Self {
        Self {
            state: WizardState::new(schema),
            generation: 0,
            validation: None,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    /// Identity of the current session; bumped on every reset.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn phase(&self) -> Phase {
        match self.state.result_state() {
            ResultState::Unset => Phase::Collecting {
                step_index: self.state.current_step_index(),
            },
            ResultState::Computing => Phase::Submitting,
            ResultState::Ready(_) => Phase::Completed,
            ResultState::Failed(_) => Phase::Failed,
        }
    }

    /// Records a field value without validating it.
    ///
    /// # Errors
    /// [`ControllerError::AlreadySubmitting`] while an estimate is pending,
    /// [`ControllerError::Completed`] while a result is displayed.
    pub fn set_answer(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ControllerError> {
        self.ensure_editable()?;
        self.state.set_answer(name, value);
        Ok(())
    }

    /// Validates the current step and either advances or starts the
    /// estimate.
    ///
    /// Only the current step's fields are checked: every one must have a
    /// non-empty answer. Format is not checked. A step without fields always
    /// passes.
    ///
    /// # Errors
    /// * [`ControllerError::Validation`] when fields are missing; the
    ///   session stays on the same step.
    /// * [`ControllerError::AlreadySubmitting`] when an estimate is
    ///   already pending.
    /// * [`ControllerError::Completed`] when a result is displayed.
    pub fn submit_current_step(&mut self) -> Result<SubmitOutcome, ControllerError> {
        self.ensure_editable()?;

        if let Err(invalid) = self.validate_current_step()? {
            warn!(
                step = invalid.step_index,
                missing = ?invalid.missing,
                "step submitted with missing answers"
            );
            self.validation = Some(invalid.clone());
            return Err(invalid.into());
        }
        self.validation = None;

        if !self.state.is_last_step() {
            let step_index = self.state.advance()?;
            return Ok(SubmitOutcome::Advanced { step_index });
        }

        self.state.set_result_state(ResultState::Computing);
        info!(
            generation = self.generation,
            answers = self.state.answers().len(),
            "final step submitted; requesting estimate"
        );
        Ok(SubmitOutcome::Submitting(EstimateRequest {
            generation: self.generation,
            answers: self.state.answers().clone(),
        }))
    }

    /// Steps back one screen.
    ///
    /// # Errors
    /// Same gating as [`Controller::set_answer`], plus
    /// [`ControllerError::Failed`] after a failed estimate: only a retry or
    /// a reset leaves that state.
    pub fn back(&mut self) -> Result<usize, ControllerError> {
        self.ensure_editable()?;
        if matches!(self.state.result_state(), ResultState::Failed(_)) {
            return Err(ControllerError::Failed);
        }
        self.validation = None;
        Ok(self.state.retreat())
    }

    /// Starts over. Any estimate still in flight becomes stale.
    pub fn reset(&mut self) {
        self.state.reset();
        self.validation = None;
        self.generation = self.generation.wrapping_add(1);
        debug!(generation = self.generation, "session reset");
    }

    /// Applies an estimator outcome, unless it belongs to an earlier session
    /// or nothing is waiting for it.
    pub fn complete(
        &mut self,
        generation: u64,
        outcome: Result<EmissionResult, EstimationError>,
    ) -> Completion {
        if generation != self.generation {
            warn!(
                completed = generation,
                current = self.generation,
                "discarding estimate for a reset session"
            );
            return Completion::Stale;
        }
        if self.state.result_state() != &ResultState::Computing {
            warn!(generation, "discarding estimate nobody is waiting for");
            return Completion::Stale;
        }

        match outcome {
            Ok(result) => {
                info!(
                    daily = %result.daily,
                    weekly = %result.weekly,
                    monthly = %result.monthly,
                    categories = result.breakdown.len(),
                    "estimate ready"
                );
                self.state.set_result_state(ResultState::Ready(result));
            }
            Err(e) => {
                error!(error = %e, "estimate failed");
                self.state.set_result_state(ResultState::Failed(e));
            }
        }
        Completion::Applied
    }

    /// Single entry point for renderer events.
    pub fn apply(
        &mut self,
        event: WizardEvent,
    ) -> Result<Transition, ControllerError> {
        match event {
            WizardEvent::FieldChanged { name, value } => {
                self.set_answer(name, value)?;
                Ok(Transition::AnswerRecorded)
            }
            WizardEvent::Next => match self.submit_current_step()? {
                SubmitOutcome::Advanced { step_index } => Ok(Transition::Advanced { step_index }),
                SubmitOutcome::Submitting(request) => Ok(Transition::Submitting(request)),
            },
            WizardEvent::Back => {
                let step_index = self.back()?;
                Ok(Transition::Retreated { step_index })
            }
            WizardEvent::ResetRequested => {
                self.reset();
                Ok(Transition::Reset)
            }
            WizardEvent::EstimateFinished {
                generation,
                outcome,
            } => Ok(match self.complete(generation, outcome) {
                Completion::Applied => Transition::EstimateApplied,
                Completion::Stale => Transition::StaleEstimateDiscarded,
            }),
        }
    }

    pub fn view(&self) -> Result<WizardView<'_>, ControllerError> {
        let step = self.state.current_step()?;
        let phase = self.phase();
        let (result, failure) = match self.state.result_state() {
            ResultState::Ready(result) => (Some(result), None),
            ResultState::Failed(e) => (None, Some(e.to_string())),
            ResultState::Unset | ResultState::Computing => (None, None),
        };

        Ok(WizardView {
            step_index: self.state.current_step_index(),
            step_count: self.state.schema().step_count(),
            step,
            answers: self.state.answers().subset(&step.fields),
            progress: self.state.progress_fraction(),
            phase,
            result,
            notice: self
                .validation
                .as_ref()
                .map(ToString::to_string)
                .or(failure),
            can_go_back: self.state.current_step_index() > 0
                && matches!(phase, Phase::Collecting { .. }),
            is_last_step: self.state.is_last_step(),
        })
    }

    fn ensure_editable(&self) -> Result<(), ControllerError> {
        match self.state.result_state() {
            ResultState::Computing => Err(ControllerError::AlreadySubmitting),
            ResultState::Ready(_) => Err(ControllerError::Completed),
            ResultState::Unset | ResultState::Failed(_) => Ok(()),
        }
    }

    fn validate_current_step(&self) -> Result<Result<(), ValidationError>, SchemaError> {
        let step = self.state.current_step()?;
        let answers = self.state.answers();
        let missing: Vec<String> = step
            .fields
            .iter()
            .filter(|f| !answers.is_answered(&f.name))
            .map(|f| f.name.clone())
            .collect();

        if missing.is_empty() {
            return Ok(Ok(()));
        }
        Ok(Err(ValidationError {
            step_index: self.state.current_step_index(),
            step_title: step.title.clone(),
            missing,
        }))
    }
}

//! Mutable session state for one pass through the questionnaire.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::estimator::EstimationError;
use crate::models::{AnswerMap, EmissionResult, StepDefinition};
use crate::schema::{SchemaError, StepSchema};

/// Contract violations on [`WizardState`]; these indicate a caller bug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("already at the last step ({index})")]
    AtLastStep { index: usize },
}

/// Where the estimate for this session stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResultState {
    #[default]
    Unset,
    Computing,
    Ready(EmissionResult),
    Failed(EstimationError),
}

/// The data owned by one interactive session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardSession {
    /// Always within `[0, step_count)`.
    pub current_step_index: usize,
    pub answers: AnswerMap,
    pub result_state: ResultState,
}

/// Holds a [`WizardSession`] against an immutable [`StepSchema`] and
/// exposes the only ways to move it.
///
/// No validation happens here; answers are accepted as typed and checked by
/// the controller when a step is submitted.
#[derive(Debug, Clone)]
pub struct WizardState {
    schema: Arc<StepSchema>,
    session: WizardSession,
}

impl WizardState {
    pub fn new(schema: Arc<StepSchema>) -> Self {
        Self {
            schema,
            session: WizardSession::default(),
        }
    }

    pub fn schema(&self) -> &StepSchema {
        &self.schema
    }

    pub fn session(&self) -> &WizardSession {
        &self.session
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.session.answers
    }

    pub fn current_step_index(&self) -> usize {
        self.session.current_step_index
    }

    pub fn current_step(&self) -> Result<&StepDefinition, SchemaError> {
        self.schema.step_at(self.session.current_step_index)
    }

    /// Upserts an answer. Never fails.
    pub fn set_answer(
        &mut self,
        field_name: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.session.answers.set(field_name, value);
    }

    /// Moves to the next step.
    ///
    /// # Errors
    /// [`WizardError::AtLastStep`] when already on the final step; check
    /// [`WizardState::is_last_step`] first.
    pub fn advance(&mut self) -> Result<usize, WizardError> {
        if self.is_last_step() {
            return Err(WizardError::AtLastStep {
                index: self.session.current_step_index,
            });
        }
        self.session.current_step_index += 1;
        debug!(step = self.session.current_step_index, "advanced");
        Ok(self.session.current_step_index)
    }

    /// Moves to the previous step, staying put on the first one.
    pub fn retreat(&mut self) -> usize {
        self.session.current_step_index = self.session.current_step_index.saturating_sub(1);
        self.session.current_step_index
    }

    pub fn is_last_step(&self) -> bool {
        self.session.current_step_index + 1 >= self.schema.step_count()
    }

    /// Back to step 0 with no answers and no result.
    pub fn reset(&mut self) {
        self.session = WizardSession::default();
    }

    /// `(current_step_index + 1) / step_count`, for display only.
    pub fn progress_fraction(&self) -> f64 {
        (self.session.current_step_index + 1) as f64 / self.schema.step_count() as f64
    }

    pub fn result_state(&self) -> &ResultState {
        &self.session.result_state
    }

    pub(crate) fn set_result_state(
        &mut self,
        state: ResultState,
    ) {
        self.session.result_state = state;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{FieldDefinition, FieldKind};

    fn schema(steps: usize) -> Arc<StepSchema> {
        let steps = (0..steps)
            .map(|i| {
                StepDefinition::new(
                    format!("Step {i}"),
                    vec![FieldDefinition::new(format!("f{i}"), "F", FieldKind::Text, "")],
                )
            })
            .collect();
        Arc::new(StepSchema::new(steps).unwrap())
    }

    #[test]
    fn new_state_starts_at_step_zero_unset() {
        let state = WizardState::new(schema(3));

        assert_eq!(state.session(), &WizardSession::default());
        assert_eq!(state.current_step().unwrap().title, "Step 0");
    }

    #[test]
    fn advance_moves_forward_until_last_step() {
        let mut state = WizardState::new(schema(3));

        assert_eq!(state.advance(), Ok(1));
        assert_eq!(state.advance(), Ok(2));
        assert!(state.is_last_step());
        assert_eq!(state.advance(), Err(WizardError::AtLastStep { index: 2 }));
        assert_eq!(state.current_step_index(), 2);
    }

    #[test]
    fn retreat_at_step_zero_is_a_no_op() {
        let mut state = WizardState::new(schema(3));

        for _ in 0..3 {
            assert_eq!(state.retreat(), 0);
        }
        assert_eq!(state.current_step_index(), 0);
    }

    #[test]
    fn retreat_moves_back_one_step() {
        let mut state = WizardState::new(schema(3));
        state.advance().unwrap();
        state.advance().unwrap();

        assert_eq!(state.retreat(), 1);
    }

    #[test]
    fn single_step_schema_is_immediately_last() {
        let state = WizardState::new(schema(1));

        assert!(state.is_last_step());
        assert_eq!(state.progress_fraction(), 1.0);
    }

    #[test]
    fn progress_fraction_counts_current_step() {
        let mut state = WizardState::new(schema(4));

        assert_eq!(state.progress_fraction(), 0.25);
        state.advance().unwrap();
        assert_eq!(state.progress_fraction(), 0.5);
    }

    #[test]
    fn set_answer_does_not_validate() {
        let mut state = WizardState::new(schema(2));

        state.set_answer("not-in-schema", "");

        assert_eq!(state.answers().get("not-in-schema"), Some(""));
    }

    #[test]
    fn reset_clears_everything() {
        let mut state = WizardState::new(schema(3));
        state.set_answer("f0", "x");
        state.advance().unwrap();
        state.set_result_state(ResultState::Failed(EstimationError::Upstream(
            "boom".to_string(),
        )));

        state.reset();

        assert_eq!(state.session(), &WizardSession::default());
    }
}

use std::sync::Arc;
use std::time::Duration;

use carbon_core::{
    AnswerMap, Controller, ControllerError, EmissionResult, EstimationError, Estimator,
    ResultState, StepSchema, SubmitOutcome, ValidationError, run_estimate,
};
use tracing::{debug, info};

use crate::answers_csv::AnswerRow;

/// What happened to one row of answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Estimated(EmissionResult),
    /// A step was submitted with fields missing; no estimate was requested.
    Invalid(ValidationError),
    Failed(EstimationError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowReport {
    pub line: u64,
    pub outcome: RowOutcome,
}

/// Runs pre-filled answers through the wizard without a terminal.
///
/// Each row gets its own [`Controller`]: the row's answers for a step are
/// entered, the step is submitted, and so on until the final submission
/// hands the full answer map to the estimator. Rows therefore pass exactly
/// the same checks an interactive user would.
pub struct BatchRunner {
    schema: Arc<StepSchema>,
    estimator: Arc<dyn Estimator>,
    timeout: Duration,
}

impl BatchRunner {
    pub fn new(
        schema: Arc<StepSchema>,
        estimator: Arc<dyn Estimator>,
        timeout: Duration,
    ) -> Self {
        Self {
            schema,
            estimator,
            timeout,
        }
    }

    /// Drives one answer map from step 0 to a result.
    ///
    /// # Errors
    /// Only controller contract violations, which a fresh controller driven
    /// forward one step at a time does not produce.
    pub async fn run_row(
        &self,
        answers: &AnswerMap,
    ) -> Result<RowOutcome, ControllerError> {
        let mut controller = Controller::new(self.schema.clone());

        for step in self.schema.steps() {
            for field in &step.fields {
                if let Some(value) = answers.get(&field.name) {
                    controller.set_answer(field.name.as_str(), value)?;
                }
            }

            let request = match controller.submit_current_step() {
                Ok(SubmitOutcome::Advanced { step_index }) => {
                    debug!(step_index, "batch row advanced");
                    continue;
                }
                Ok(SubmitOutcome::Submitting(request)) => request,
                Err(ControllerError::Validation(invalid)) => {
                    return Ok(RowOutcome::Invalid(invalid));
                }
                Err(other) => return Err(other),
            };

            let outcome =
                run_estimate(self.estimator.as_ref(), &request.answers, self.timeout).await;
            controller.complete(request.generation, outcome);
            break;
        }

        Ok(match controller.state().result_state() {
            ResultState::Ready(result) => RowOutcome::Estimated(result.clone()),
            ResultState::Failed(e) => RowOutcome::Failed(e.clone()),
            ResultState::Unset | ResultState::Computing => RowOutcome::Failed(
                EstimationError::Configuration("estimate was never applied".to_string()),
            ),
        })
    }

    /// Runs every row in order. Rows are independent; a failed or invalid
    /// row does not stop the batch.
    pub async fn run(
        &self,
        rows: &[AnswerRow],
    ) -> Result<Vec<RowReport>, ControllerError> {
        let mut reports = Vec::with_capacity(rows.len());
        for row in rows {
            let outcome = self.run_row(&row.answers).await?;
            info!(
                line = row.line,
                estimator = self.estimator.name(),
                outcome = outcome.label(),
                "batch row finished"
            );
            reports.push(RowReport {
                line: row.line,
                outcome,
            });
        }
        Ok(reports)
    }
}

impl RowOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Estimated(_) => "estimated",
            Self::Invalid(_) => "invalid",
            Self::Failed(_) => "failed",
        }
    }
}

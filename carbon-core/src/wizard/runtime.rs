use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::controller::{Completion, Controller, ControllerError, Phase, Transition, WizardEvent};
use crate::estimator::{EstimationError, Estimator};
use crate::models::{AnswerMap, EmissionResult};

type Finished = (u64, Result<EmissionResult, EstimationError>);

/// Runs one estimator call under `timeout`, checks the figures it returns
/// and rounds them to two decimals.
///
/// A negative figure is reported as [`EstimationError::MalformedResponse`];
/// running out of time as [`EstimationError::Timeout`].
pub async fn run_estimate(
    estimator: &dyn Estimator,
    answers: &AnswerMap,
    timeout: Duration,
) -> Result<EmissionResult, EstimationError> {
    debug!(
        estimator = estimator.name(),
        timeout_secs = timeout.as_secs(),
        "running estimate"
    );
    match tokio::time::timeout(timeout, estimator.compute(answers)).await {
        Ok(Ok(result)) => {
            result
                .validate()
                .map_err(|e| EstimationError::MalformedResponse(e.to_string()))?;
            Ok(result.normalized())
        }
        Ok(Err(e)) => Err(e),
        Err(_) => Err(EstimationError::Timeout {
            seconds: timeout.as_secs(),
        }),
    }
}

/// Owns a [`Controller`] and runs its estimator calls in the background.
///
/// Renderer events go through [`WizardRuntime::dispatch`]. When the final
/// step is submitted the estimator call is spawned onto the tokio runtime,
/// tagged with the session generation; its outcome comes back through a
/// channel and is applied by [`WizardRuntime::wait_for_estimate`]. A reset
/// in the meantime makes that outcome stale and it is dropped.
pub struct WizardRuntime {
    controller: Controller,
    estimator: Arc<dyn Estimator>,
    timeout: Duration,
    finished_tx: mpsc::UnboundedSender<Finished>,
    finished_rx: mpsc::UnboundedReceiver<Finished>,
    in_flight: usize,
}

impl WizardRuntime {
    pub fn new(
        controller: Controller,
        estimator: Arc<dyn Estimator>,
        timeout: Duration,
    ) -> Self {
        let (finished_tx, finished_rx) = mpsc::unbounded_channel();
        Self {
            controller,
            estimator,
            timeout,
            finished_tx,
            finished_rx,
            in_flight: 0,
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Number of estimator calls whose outcome has not been collected yet,
    /// stale ones included.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Applies a renderer event; spawns the estimator call if the event
    /// started a submission.
    pub fn dispatch(
        &mut self,
        event: WizardEvent,
    ) -> Result<Transition, ControllerError> {
        let transition = self.controller.apply(event)?;
        if let Transition::Submitting(request) = &transition {
            self.spawn_estimate(request.generation, request.answers.clone());
        }
        Ok(transition)
    }

    /// Waits for the next estimator outcome and applies it.
    ///
    /// Returns `None` when nothing is in flight.
    pub async fn wait_for_estimate(&mut self) -> Option<Completion> {
        if self.in_flight == 0 {
            return None;
        }
        let (generation, outcome) = self.finished_rx.recv().await?;
        self.in_flight -= 1;
        Some(self.controller.complete(generation, outcome))
    }

    /// Waits until the current submission resolves, skipping stale outcomes
    /// from earlier sessions.
    pub async fn settle(&mut self) -> Phase {
        while self.controller.phase() == Phase::Submitting {
            if self.wait_for_estimate().await.is_none() {
                warn!("session is submitting but no estimate is in flight");
                break;
            }
        }
        self.controller.phase()
    }

    fn spawn_estimate(
        &mut self,
        generation: u64,
        answers: AnswerMap,
    ) {
        let estimator = Arc::clone(&self.estimator);
        let finished_tx = self.finished_tx.clone();
        let timeout = self.timeout;
        self.in_flight += 1;

        tokio::spawn(async move {
            let outcome = run_estimate(estimator.as_ref(), &answers, timeout).await;
            // The receiver only goes away with the runtime itself.
            let _ = finished_tx.send((generation, outcome));
        });
    }
}

//! End-to-end flows through `WizardRuntime` with real (spawned) estimator
//! calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tokio::sync::Semaphore;

use carbon_core::{
    AnswerMap, CategoryContribution, Completion, Controller, ControllerError, EmissionResult,
    EstimationError, Estimator, FieldDefinition, FieldKind, MockEstimator, Phase, ResultState,
    StepDefinition, StepSchema, Transition, WizardEvent, WizardRuntime, WizardSession,
};

const TIMEOUT: Duration = Duration::from_secs(30);

/// Step 0: `[name]`, step 1: `[mileage]`.
fn two_step_schema() -> Arc<StepSchema> {
    Arc::new(
        StepSchema::new(vec![
            StepDefinition::new(
                "About you",
                vec![FieldDefinition::new("name", "Name", FieldKind::Text, "")],
            ),
            StepDefinition::new(
                "Travel",
                vec![FieldDefinition::new("mileage", "Daily Mileage", FieldKind::Number, "")],
            ),
        ])
        .unwrap(),
    )
}

fn runtime_with(estimator: impl Estimator + 'static) -> WizardRuntime {
    WizardRuntime::new(Controller::new(two_step_schema()), Arc::new(estimator), TIMEOUT)
}

fn field(
    name: &str,
    value: &str,
) -> WizardEvent {
    WizardEvent::FieldChanged {
        name: name.to_string(),
        value: value.to_string(),
    }
}

/// Answers both steps and submits the last one.
fn fill_and_submit(runtime: &mut WizardRuntime) -> Transition {
    runtime.dispatch(field("name", "Ana")).unwrap();
    assert_eq!(
        runtime.dispatch(WizardEvent::Next),
        Ok(Transition::Advanced { step_index: 1 })
    );
    runtime.dispatch(field("mileage", "10")).unwrap();
    runtime.dispatch(WizardEvent::Next).unwrap()
}

/// Remembers every answer map it was asked about.
#[derive(Default)]
struct RecordingEstimator {
    seen: Arc<Mutex<Vec<AnswerMap>>>,
}

#[async_trait]
impl Estimator for RecordingEstimator {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn compute(
        &self,
        answers: &AnswerMap,
    ) -> Result<EmissionResult, EstimationError> {
        self.seen.lock().unwrap().push(answers.clone());
        MockEstimator::new().compute(answers).await
    }
}

/// Blocks every call until a permit is added to `gate`.
struct GatedEstimator {
    gate: Arc<Semaphore>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Estimator for GatedEstimator {
    fn name(&self) -> &'static str {
        "gated"
    }

    async fn compute(
        &self,
        answers: &AnswerMap,
    ) -> Result<EmissionResult, EstimationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| EstimationError::Upstream("gate closed".to_string()))?;
        MockEstimator::new().compute(answers).await
    }
}

fn gated() -> (GatedEstimator, Arc<Semaphore>, Arc<AtomicUsize>) {
    let gate = Arc::new(Semaphore::new(0));
    let calls = Arc::new(AtomicUsize::new(0));
    (
        GatedEstimator {
            gate: gate.clone(),
            calls: calls.clone(),
        },
        gate,
        calls,
    )
}

#[tokio::test]
async fn two_step_flow_sends_all_answers_and_completes() {
    let estimator = RecordingEstimator::default();
    let seen = estimator.seen.clone();
    let mut runtime = runtime_with(estimator);

    let submitted = fill_and_submit(&mut runtime);
    let phase = runtime.settle().await;

    assert!(matches!(submitted, Transition::Submitting(_)));
    assert_eq!(phase, Phase::Completed);
    let expected: AnswerMap = [("name", "Ana"), ("mileage", "10")].into_iter().collect();
    assert_eq!(*seen.lock().unwrap(), vec![expected]);
    assert_eq!(
        runtime.controller().state().result_state(),
        &ResultState::Ready(MockEstimator::new().result().clone())
    );
}

#[tokio::test]
async fn submitting_empty_first_step_is_a_validation_error() {
    let mut runtime = runtime_with(MockEstimator::new());

    let result = runtime.dispatch(WizardEvent::Next);

    assert!(matches!(result, Err(ControllerError::Validation(_))));
    assert_eq!(runtime.controller().state().current_step_index(), 0);
    assert_eq!(runtime.in_flight(), 0);
}

#[tokio::test]
async fn estimator_failure_is_surfaced_then_cleared_by_reset() {
    let mut runtime = runtime_with(MockEstimator::failing("upstream rejected"));

    fill_and_submit(&mut runtime);
    let phase = runtime.settle().await;

    assert_eq!(phase, Phase::Failed);
    assert_eq!(
        runtime.controller().state().result_state(),
        &ResultState::Failed(EstimationError::Upstream("upstream rejected".to_string()))
    );

    runtime.dispatch(WizardEvent::ResetRequested).unwrap();

    assert_eq!(runtime.controller().state().result_state(), &ResultState::Unset);
    assert_eq!(runtime.controller().state().session(), &WizardSession::default());
}

#[tokio::test]
async fn failed_estimate_can_be_resubmitted() {
    let mut runtime = runtime_with(MockEstimator::failing("upstream rejected"));
    fill_and_submit(&mut runtime);
    runtime.settle().await;

    let retry = runtime.dispatch(WizardEvent::Next).unwrap();

    assert!(matches!(retry, Transition::Submitting(_)));
    assert_eq!(runtime.settle().await, Phase::Failed);
}

#[tokio::test]
async fn second_submit_while_pending_is_rejected_and_not_sent() {
    let (estimator, gate, calls) = gated();
    let mut runtime = runtime_with(estimator);

    fill_and_submit(&mut runtime);
    let second = runtime.dispatch(WizardEvent::Next);
    gate.add_permits(1);
    let phase = runtime.settle().await;

    assert_eq!(second, Err(ControllerError::AlreadySubmitting));
    assert_eq!(phase, Phase::Completed);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn reset_while_submitting_discards_late_result() {
    let (estimator, gate, _calls) = gated();
    let mut runtime = runtime_with(estimator);

    fill_and_submit(&mut runtime);
    runtime.dispatch(WizardEvent::ResetRequested).unwrap();
    gate.add_permits(1);
    let completion = runtime.wait_for_estimate().await;

    assert_eq!(completion, Some(Completion::Stale));
    assert_eq!(runtime.controller().state().session(), &WizardSession::default());
    assert_eq!(runtime.in_flight(), 0);
}

#[tokio::test]
async fn stale_result_is_skipped_while_settling_new_submission() {
    let (estimator, gate, calls) = gated();
    let mut runtime = runtime_with(estimator);

    fill_and_submit(&mut runtime);
    runtime.dispatch(WizardEvent::ResetRequested).unwrap();
    fill_and_submit(&mut runtime);
    gate.add_permits(2);
    let phase = runtime.settle().await;

    assert_eq!(phase, Phase::Completed);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn slow_estimator_times_out() {
    let slow = MockEstimator::new().with_latency(Duration::from_secs(120));
    let mut runtime = WizardRuntime::new(
        Controller::new(two_step_schema()),
        Arc::new(slow),
        Duration::from_secs(5),
    );

    fill_and_submit(&mut runtime);
    let phase = runtime.settle().await;

    assert_eq!(phase, Phase::Failed);
    assert_eq!(
        runtime.controller().state().result_state(),
        &ResultState::Failed(EstimationError::Timeout { seconds: 5 })
    );
}

#[tokio::test]
async fn negative_figures_are_reported_as_malformed() {
    let bad = MockEstimator::with_result(EmissionResult {
        daily: dec!(1),
        weekly: dec!(7),
        monthly: dec!(30),
        breakdown: vec![CategoryContribution::new("Diet", dec!(-1))],
    });
    let mut runtime = runtime_with(bad);

    fill_and_submit(&mut runtime);
    runtime.settle().await;

    assert!(matches!(
        runtime.controller().state().result_state(),
        ResultState::Failed(EstimationError::MalformedResponse(_))
    ));
}

#[tokio::test]
async fn wait_without_pending_estimate_returns_none() {
    let mut runtime = runtime_with(MockEstimator::new());

    assert_eq!(runtime.wait_for_estimate().await, None);
}

#[test]
fn step_index_stays_in_range_under_any_event_sequence() {
    let schema = two_step_schema();
    let mut controller = Controller::new(schema.clone());
    let events = [
        WizardEvent::Back,
        WizardEvent::Next,
        field("name", "Ana"),
        WizardEvent::Next,
        WizardEvent::Next,
        WizardEvent::Back,
        WizardEvent::Back,
        WizardEvent::Back,
        WizardEvent::Next,
        field("mileage", "3"),
        WizardEvent::Next,
        WizardEvent::Next,
        WizardEvent::Back,
        WizardEvent::ResetRequested,
        WizardEvent::Back,
    ];

    for event in events.iter().cycle().take(200) {
        let _ = controller.apply(event.clone());
        assert!(controller.state().current_step_index() < schema.step_count());
    }
}

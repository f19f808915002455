//! Test assertions for pipeline results.

use crate::core::{PipelineStage, RunState};
use crate::errors::PipelineError;
use crate::events::ProgressSubscription;
use crate::pipeline::RunOutcome;

/// Asserts that a run failed at `stage` with the given failure kind, and
/// returns the error.
#[track_caller]
pub fn assert_failed_at(
    result: Result<RunOutcome, PipelineError>,
    stage: PipelineStage,
    kind: &str,
) -> PipelineError {
    let error = match result {
        Ok(outcome) => panic!("Expected failure at {stage}, run {} succeeded", outcome.run_id()),
        Err(error) => error,
    };
    assert_eq!(error.stage, stage, "Expected failure at {stage}, got {}", error.stage);
    assert_eq!(
        error.source.kind(),
        kind,
        "Expected {kind} at {stage}, got {}",
        error.source
    );
    assert_eq!(error.failed_transition(), RunState::after(stage));
    error
}

/// Drains a subscription and asserts the delivered step ordinals.
#[track_caller]
pub fn assert_progress_steps(subscription: &mut ProgressSubscription, expected: &[u8]) {
    let steps: Vec<u8> = subscription.drain().into_iter().map(|e| e.step).collect();
    assert_eq!(
        steps,
        expected,
        "Unexpected progress steps for client '{}'",
        subscription.client_id()
    );
}

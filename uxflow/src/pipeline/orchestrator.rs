//! The four-stage critique pipeline.
//!
//! Stages run strictly in order: vision, heuristics, feedback, wireframe.
//! Each stage starts only after the previous one produced parsed output.
//! A failure at any stage ends the run with a single [`PipelineError`]; no
//! partial artifacts are returned, although whatever was already written to
//! the result store stays there.

use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::invoker::{Invocation, StageInvoker};
use super::prompts::{PromptInputs, PromptTemplates};
use crate::config::PipelineConfig;
use crate::core::{
    EvaluationRecord, FeedbackReport, HeuristicEvaluation, PipelineRun, PipelineStage, RunState,
    ScreenshotRef, StageAttempts, StructuredArtifact, VisionAnalysis, WireframeArtifact,
    EVALUATION_ARTIFACT,
    FEEDBACK_MARKDOWN_ARTIFACT, RUN_ARTIFACT,
};
use crate::errors::{PipelineError, StageFailure};
use crate::events::{EventSink, NoOpEventSink, NoOpProgressSink, PipelineEvent, ProgressSink};
use crate::extract::JsonExtractor;
use crate::model::{GenerativeModel, ModelRequest};
use crate::observability::SpanTimer;
use crate::render::feedback_markdown;
use crate::store::{put_json, ResultStore};
use crate::utils::generate_run_id;

/// A successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// The complete run record.
    pub run: PipelineRun,
}

impl RunOutcome {
    /// The run id.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run.run_id
    }

    /// The feedback report.
    #[must_use]
    pub fn feedback(&self) -> &FeedbackReport {
        &self.run.feedback
    }

    /// The wireframe.
    #[must_use]
    pub fn wireframe(&self) -> &WireframeArtifact {
        &self.run.wireframe
    }

    /// Splits into the two caller-facing artifacts.
    #[must_use]
    pub fn into_artifacts(self) -> (FeedbackReport, WireframeArtifact) {
        (self.run.feedback, self.run.wireframe)
    }
}

/// Tracks one run through its states and reports every transition.
struct RunTracker<'a> {
    run_id: Uuid,
    state: RunState,
    client_id: Option<&'a str>,
    progress: &'a dyn ProgressSink,
    events: &'a dyn EventSink,
    timer: SpanTimer,
}

impl<'a> RunTracker<'a> {
    fn new(
        orchestrator: &'a PipelineOrchestrator,
        run_id: Uuid,
        state: RunState,
        client_id: Option<&'a str>,
    ) -> Self {
        Self {
            run_id,
            state,
            client_id,
            progress: orchestrator.progress.as_ref(),
            events: orchestrator.events.as_ref(),
            timer: SpanTimer::start(run_id.to_string()),
        }
    }

    async fn started(&self) {
        let Some(first) = self.state.next_stage() else {
            return;
        };
        tracing::info!(run_id = %self.run_id, first_stage = first.name(), "Pipeline started");
        self.events.emit(&PipelineEvent::started(self.run_id, first)).await;
    }

    async fn stage_done<T>(&mut self, stage: PipelineStage, invocation: &Invocation<T>) {
        match self.state.advance(stage) {
            Some(next) => self.state = next,
            None => tracing::error!(
                run_id = %self.run_id,
                state = %self.state,
                stage = stage.name(),
                "Out-of-order stage completion"
            ),
        }

        if let Some(client_id) = self.client_id {
            self.progress
                .notify(client_id, stage.progress_message(), stage.ordinal());
        }

        self.events
            .emit(&PipelineEvent::stage_completed(
                self.run_id,
                stage,
                invocation.attempts,
                invocation.duration_ms,
            ))
            .await;
    }

    async fn fail(&mut self, stage: PipelineStage, failure: StageFailure) -> PipelineError {
        let error = PipelineError::new(self.run_id, stage, failure);
        self.state = error.terminal_state();

        tracing::error!(
            run_id = %self.run_id,
            stage = stage.name(),
            error_type = error.source.kind(),
            error = %error.source,
            "Pipeline failed"
        );
        self.events
            .emit(&PipelineEvent::stage_failed(self.run_id, stage, &error.source))
            .await;
        self.events.emit(&PipelineEvent::failed(&error)).await;
        error
    }

    async fn finished(self) {
        let last = match &self.state {
            RunState::WireframeDone => PipelineStage::Wireframe,
            _ => PipelineStage::Feedback,
        };
        let duration_ms = self.timer.finish();
        tracing::info!(
            run_id = %self.run_id,
            state = %self.state,
            duration_ms,
            "Pipeline completed"
        );
        self.events
            .emit(&PipelineEvent::completed(self.run_id, last, duration_ms))
            .await;
    }
}

/// Runs screenshots through the four stages.
pub struct PipelineOrchestrator {
    invoker: StageInvoker,
    prompts: PromptTemplates,
    progress: Arc<dyn ProgressSink>,
    events: Arc<dyn EventSink>,
}

impl std::fmt::Debug for PipelineOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOrchestrator")
            .field("invoker", &self.invoker)
            .finish_non_exhaustive()
    }
}

impl PipelineOrchestrator {
    /// Creates an orchestrator with default prompts and no observers.
    #[must_use]
    pub fn new(invoker: StageInvoker) -> Self {
        Self {
            invoker,
            prompts: PromptTemplates::default(),
            progress: Arc::new(NoOpProgressSink),
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Builds the invoker from a configuration.
    #[must_use]
    pub fn from_config(
        model: Arc<dyn GenerativeModel>,
        store: Arc<dyn ResultStore>,
        config: &PipelineConfig,
    ) -> Self {
        let invoker = StageInvoker::new(model, store)
            .with_policy(config.retry.clone())
            .with_extractor(JsonExtractor::new(config.diagnostic_truncate));
        Self::new(invoker)
    }

    /// Sets the prompt templates.
    #[must_use]
    pub fn with_prompts(mut self, prompts: PromptTemplates) -> Self {
        self.prompts = prompts;
        self
    }

    /// Sets the progress sink.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Sets the lifecycle event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// The result store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ResultStore> {
        self.invoker.store()
    }

    /// Runs all four stages.
    pub async fn run(
        &self,
        screenshot: &ScreenshotRef,
        client_id: Option<&str>,
    ) -> Result<RunOutcome, PipelineError> {
        let mut tracker = RunTracker::new(self, generate_run_id(), RunState::Init, client_id);
        tracker.started().await;

        let evaluation = self.evaluate_stages(&mut tracker, screenshot).await?;
        let outcome = self.wireframe_stage(&mut tracker, evaluation).await?;

        tracker.finished().await;
        Ok(outcome)
    }

    /// Runs the first three stages and persists the evaluation record.
    pub async fn evaluate(
        &self,
        screenshot: &ScreenshotRef,
        client_id: Option<&str>,
    ) -> Result<EvaluationRecord, PipelineError> {
        let mut tracker = RunTracker::new(self, generate_run_id(), RunState::Init, client_id);
        tracker.started().await;

        let evaluation = self.evaluate_stages(&mut tracker, screenshot).await?;

        tracker.finished().await;
        Ok(evaluation)
    }

    /// Runs the wireframe stage for an earlier evaluation.
    pub async fn complete_wireframe(
        &self,
        evaluation: EvaluationRecord,
        client_id: Option<&str>,
    ) -> Result<RunOutcome, PipelineError> {
        let mut tracker =
            RunTracker::new(self, evaluation.run_id, RunState::FeedbackDone, client_id);
        tracker.started().await;

        let outcome = self.wireframe_stage(&mut tracker, evaluation).await?;

        tracker.finished().await;
        Ok(outcome)
    }

    /// Runs all four stages on a background task.
    ///
    /// Aborting the handle abandons the run; shared state is unaffected.
    pub fn spawn(
        self: &Arc<Self>,
        screenshot: ScreenshotRef,
        client_id: Option<String>,
    ) -> JoinHandle<Result<RunOutcome, PipelineError>> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move { orchestrator.run(&screenshot, client_id.as_deref()).await })
    }

    async fn structured_stage<A: StructuredArtifact>(
        &self,
        tracker: &mut RunTracker<'_>,
        request: ModelRequest,
    ) -> Result<Invocation<A>, PipelineError> {
        match self.invoker.invoke_structured::<A>(tracker.run_id, &request).await {
            Ok(invocation) => {
                tracker.stage_done(A::STAGE, &invocation).await;
                Ok(invocation)
            }
            Err(failure) => Err(tracker.fail(A::STAGE, failure).await),
        }
    }

    async fn evaluate_stages(
        &self,
        tracker: &mut RunTracker<'_>,
        screenshot: &ScreenshotRef,
    ) -> Result<EvaluationRecord, PipelineError> {
        let run_id = tracker.run_id;
        let created_at = Utc::now();

        let prompt = self
            .prompts
            .render(PipelineStage::Vision, PromptInputs::default());
        let request = ModelRequest::text(prompt).with_image(screenshot.to_image_part());
        let vision = self
            .structured_stage::<VisionAnalysis>(tracker, request)
            .await?;
        let vision_json = vision.output.to_pretty_json();

        let prompt = self.prompts.render(
            PipelineStage::Heuristics,
            PromptInputs {
                vision_analysis: Some(&vision_json),
                ..PromptInputs::default()
            },
        );
        let heuristics = self
            .structured_stage::<HeuristicEvaluation>(tracker, ModelRequest::text(prompt))
            .await?;
        let heuristics_json = heuristics.output.to_pretty_json();

        let prompt = self.prompts.render(
            PipelineStage::Feedback,
            PromptInputs {
                vision_analysis: Some(&vision_json),
                heuristic_evaluation: Some(&heuristics_json),
                feedback: None,
            },
        );
        let feedback = self
            .structured_stage::<FeedbackReport>(tracker, ModelRequest::text(prompt))
            .await?;

        let attempts: StageAttempts = [
            (PipelineStage::Vision, vision.attempts),
            (PipelineStage::Heuristics, heuristics.attempts),
            (PipelineStage::Feedback, feedback.attempts),
        ]
        .into_iter()
        .collect();

        let record = EvaluationRecord {
            run_id,
            created_at,
            screenshot: screenshot.metadata(),
            original_analysis: vision.output,
            heuristics: heuristics.output,
            report: feedback.output,
            attempts,
        };

        self.persist_json(run_id, EVALUATION_ARTIFACT, &record).await;
        let markdown = feedback_markdown(&record.report, run_id, Utc::now());
        self.persist_text(run_id, FEEDBACK_MARKDOWN_ARTIFACT, &markdown)
            .await;

        Ok(record)
    }

    async fn wireframe_stage(
        &self,
        tracker: &mut RunTracker<'_>,
        evaluation: EvaluationRecord,
    ) -> Result<RunOutcome, PipelineError> {
        let stage = PipelineStage::Wireframe;
        let run_id = tracker.run_id;

        let vision_json = evaluation.original_analysis.to_pretty_json();
        let feedback_json = evaluation.report.to_pretty_json();
        let prompt = self.prompts.render(
            stage,
            PromptInputs {
                vision_analysis: Some(&vision_json),
                heuristic_evaluation: None,
                feedback: Some(&feedback_json),
            },
        );

        let wireframe = match self
            .invoker
            .invoke_text(run_id, &ModelRequest::text(prompt))
            .await
        {
            Ok(invocation) => invocation,
            Err(failure) => return Err(tracker.fail(stage, failure).await),
        };
        tracker.stage_done(stage, &wireframe).await;

        let run = PipelineRun::complete(evaluation, wireframe.output, wireframe.attempts);
        self.persist_json(run_id, RUN_ARTIFACT, &run).await;

        Ok(RunOutcome { run })
    }

    async fn persist_json<T: serde::Serialize + Sync>(&self, run_id: Uuid, artifact: &str, value: &T) {
        if let Err(err) = put_json(self.store().as_ref(), run_id, artifact, value).await {
            log_storage_failure(run_id, artifact, &err);
        }
    }

    async fn persist_text(&self, run_id: Uuid, artifact: &str, content: &str) {
        if let Err(err) = self.store().put(run_id, artifact, content).await {
            log_storage_failure(run_id, artifact, &err);
        }
    }
}

fn log_storage_failure(run_id: Uuid, artifact: &str, err: &crate::errors::StoreError) {
    tracing::warn!(
        run_id = %run_id,
        artifact,
        error = %err,
        error_type = "StorageWriteFailed",
        "Failed to persist run artifact"
    );
}

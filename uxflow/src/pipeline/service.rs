//! Request-level facade over the orchestrator.
//!
//! Mirrors the two ways a caller drives a run: evaluate now and ask for the
//! wireframe later by run id, or do both in one call.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::orchestrator::{PipelineOrchestrator, RunOutcome};
use crate::config::PipelineConfig;
use crate::core::{
    EvaluationRecord, FeedbackReport, PipelineRun, PipelineStage, ScreenshotRef,
    WireframeArtifact, EVALUATION_ARTIFACT, RUN_ARTIFACT,
};
use crate::errors::{PipelineError, UxflowError};
use crate::model::GenerativeModel;
use crate::store::{get_json, validate_artifact_name, ResultStore};
use crate::utils::parse_run_id;

/// Evaluates screenshots and serves their artifacts.
#[derive(Debug, Clone)]
pub struct PipelineService {
    orchestrator: Arc<PipelineOrchestrator>,
    /// One lock per run with a wireframe request in flight.
    wireframe_locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl PipelineService {
    /// Wraps an orchestrator.
    #[must_use]
    pub fn new(orchestrator: Arc<PipelineOrchestrator>) -> Self {
        Self {
            orchestrator,
            wireframe_locks: Arc::new(DashMap::new()),
        }
    }

    /// Builds a service with default prompts and no observers.
    #[must_use]
    pub fn from_config(
        model: Arc<dyn GenerativeModel>,
        store: Arc<dyn ResultStore>,
        config: &PipelineConfig,
    ) -> Self {
        Self::new(Arc::new(PipelineOrchestrator::from_config(
            model, store, config,
        )))
    }

    /// The orchestrator.
    #[must_use]
    pub fn orchestrator(&self) -> &Arc<PipelineOrchestrator> {
        &self.orchestrator
    }

    fn store(&self) -> &dyn ResultStore {
        self.orchestrator.store().as_ref()
    }

    /// Phase one: runs vision, heuristics and feedback.
    ///
    /// Returns the run id to pass to [`Self::generate_wireframe`].
    pub async fn evaluate(
        &self,
        screenshot: &ScreenshotRef,
        client_id: Option<&str>,
    ) -> Result<(Uuid, FeedbackReport), UxflowError> {
        let record = self.orchestrator.evaluate(screenshot, client_id).await?;
        Ok((record.run_id, record.report))
    }

    /// Phase two: generates the wireframe for an evaluated run.
    ///
    /// A run whose wireframe already exists returns the stored one without
    /// calling the model again. Concurrent requests for the same run are
    /// serialized, so every caller gets the stored wireframe.
    pub async fn generate_wireframe(
        &self,
        run_id: &str,
        client_id: Option<&str>,
    ) -> Result<WireframeArtifact, UxflowError> {
        let id = parse_run_id(run_id).ok_or_else(|| UxflowError::RunNotFound(run_id.to_string()))?;

        let lock = Arc::clone(self.wireframe_locks.entry(id).or_default().value());
        let guard = lock.lock().await;
        let result = self.wireframe_once(id, run_id, client_id).await;
        drop(guard);
        drop(lock);
        self.wireframe_locks
            .remove_if(&id, |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    async fn wireframe_once(
        &self,
        id: Uuid,
        run_id: &str,
        client_id: Option<&str>,
    ) -> Result<WireframeArtifact, UxflowError> {
        let artifact = PipelineStage::Wireframe.artifact_name();
        if let Some(html) = self.store().get(id, artifact).await? {
            tracing::info!(run_id = %id, "Wireframe already generated");
            return Ok(WireframeArtifact::new(html));
        }

        let evaluation: EvaluationRecord = get_json(self.store(), id, EVALUATION_ARTIFACT)
            .await?
            .ok_or_else(|| UxflowError::RunNotFound(run_id.to_string()))?;

        let generated = self
            .orchestrator
            .complete_wireframe(evaluation, client_id)
            .await?
            .into_artifacts()
            .1;

        // Another process sharing the store may have published first.
        match self.store().get(id, artifact).await? {
            Some(stored) if stored != generated.html() => {
                tracing::info!(run_id = %id, "Returning wireframe published by another writer");
                Ok(WireframeArtifact::new(stored))
            }
            _ => Ok(generated),
        }
    }

    /// Runs all four stages in one call.
    pub async fn run(
        &self,
        screenshot: &ScreenshotRef,
        client_id: Option<&str>,
    ) -> Result<RunOutcome, UxflowError> {
        Ok(self.orchestrator.run(screenshot, client_id).await?)
    }

    /// Runs all four stages on a background task.
    pub fn spawn_run(
        &self,
        screenshot: ScreenshotRef,
        client_id: Option<String>,
    ) -> JoinHandle<Result<RunOutcome, PipelineError>> {
        self.orchestrator.spawn(screenshot, client_id)
    }

    /// The stored wireframe of a run.
    pub async fn wireframe(&self, run_id: &str) -> Result<WireframeArtifact, UxflowError> {
        self.artifact(run_id, PipelineStage::Wireframe.artifact_name())
            .await
            .map(WireframeArtifact::new)
    }

    /// The stored record of a completed run.
    pub async fn run_record(&self, run_id: &str) -> Result<PipelineRun, UxflowError> {
        let id = parse_run_id(run_id).ok_or_else(|| UxflowError::RunNotFound(run_id.to_string()))?;
        get_json(self.store(), id, RUN_ARTIFACT)
            .await?
            .ok_or_else(|| UxflowError::RunNotFound(run_id.to_string()))
    }

    /// Any stored artifact of a run, by name.
    pub async fn artifact(&self, run_id: &str, name: &str) -> Result<String, UxflowError> {
        let id = parse_run_id(run_id).ok_or_else(|| UxflowError::RunNotFound(run_id.to_string()))?;
        validate_artifact_name(name)?;
        self.store()
            .get(id, name)
            .await?
            .ok_or_else(|| UxflowError::RunNotFound(format!("{run_id}/{name}")))
    }
}

//! Calls the model for one stage and turns its text into a typed artifact.
//!
//! Unparseable output is retried under the [`RetryPolicy`]; transport
//! failures are returned at once. Successful output is written to the
//! result store, and a failed write is only logged.

use std::sync::Arc;
use uuid::Uuid;

use super::retry::{with_retry, RetryClass, RetryError, RetryPolicy};
use crate::core::{JsonObject, PipelineStage, StructuredArtifact, WireframeArtifact};
use crate::errors::{ExtractError, ModelError, StageFailure};
use crate::extract::{clean_wireframe_html, truncate_chars, JsonExtractor};
use crate::model::{GenerativeModel, ModelRequest};
use crate::observability::{SpanTimer, StageSpanAttributes};
use crate::store::ResultStore;

/// A stage output and what it cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation<T> {
    /// The parsed output.
    pub output: T,
    /// Model calls made.
    pub attempts: usize,
    /// Wall-clock time across all attempts.
    pub duration_ms: f64,
}

impl<T> Invocation<T> {
    fn map<U>(self, f: impl FnOnce(T) -> U) -> Invocation<U> {
        Invocation {
            output: f(self.output),
            attempts: self.attempts,
            duration_ms: self.duration_ms,
        }
    }
}

#[derive(Debug)]
enum AttemptError {
    Model(ModelError),
    Malformed(ExtractError),
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Model(e) => e.fmt(f),
            Self::Malformed(e) => e.fmt(f),
        }
    }
}

fn classify(error: &AttemptError) -> RetryClass {
    match error {
        AttemptError::Model(_) => RetryClass::Fatal,
        AttemptError::Malformed(_) => RetryClass::Retryable,
    }
}

fn into_failure(error: RetryError<AttemptError>) -> StageFailure {
    let (attempts, error) = match error {
        RetryError::Exhausted {
            attempts,
            last_error,
        } => (attempts, last_error),
        RetryError::Fatal { attempts, error } => (attempts, error),
    };
    match error {
        AttemptError::Model(e) => StageFailure::ModelCallFailed(e),
        AttemptError::Malformed(last_error) => StageFailure::StageOutputInvalid {
            attempts,
            last_error,
        },
    }
}

/// Runs single stages against a model.
#[derive(Clone)]
pub struct StageInvoker {
    model: Arc<dyn GenerativeModel>,
    store: Arc<dyn ResultStore>,
    policy: RetryPolicy,
    extractor: JsonExtractor,
}

impl std::fmt::Debug for StageInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageInvoker")
            .field("policy", &self.policy)
            .field("extractor", &self.extractor)
            .finish_non_exhaustive()
    }
}

impl StageInvoker {
    /// Creates an invoker with the default policy (two attempts).
    #[must_use]
    pub fn new(model: Arc<dyn GenerativeModel>, store: Arc<dyn ResultStore>) -> Self {
        Self {
            model,
            store,
            policy: RetryPolicy::default(),
            extractor: JsonExtractor::default(),
        }
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the JSON extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: JsonExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// The retry policy.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The result store outputs are written to.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    /// Runs a JSON stage and returns the parsed object.
    pub async fn invoke(
        &self,
        run_id: Uuid,
        stage: PipelineStage,
        request: &ModelRequest,
    ) -> Result<Invocation<JsonObject>, StageFailure> {
        let extractor = self.extractor;
        let invocation = self
            .call(run_id, stage, request, |text| extractor.extract(text))
            .await?;

        let content = serde_json::to_string_pretty(&invocation.output)
            .unwrap_or_else(|_| "{}".to_string());
        self.persist(run_id, stage, &content).await;
        Ok(invocation)
    }

    /// Runs the stage that produces `A`.
    pub async fn invoke_structured<A: StructuredArtifact>(
        &self,
        run_id: Uuid,
        request: &ModelRequest,
    ) -> Result<Invocation<A>, StageFailure> {
        let invocation = self.invoke(run_id, A::STAGE, request).await?;
        Ok(invocation.map(A::from_object))
    }

    /// Runs the wireframe stage: the output is cleaned HTML, not JSON.
    pub async fn invoke_text(
        &self,
        run_id: Uuid,
        request: &ModelRequest,
    ) -> Result<Invocation<WireframeArtifact>, StageFailure> {
        let stage = PipelineStage::Wireframe;
        let diagnostic_chars = self.extractor.diagnostic_chars();
        let invocation = self
            .call(run_id, stage, request, |text| {
                clean_wireframe_html(text).ok_or_else(|| {
                    ExtractError::malformed(
                        "no HTML document in output",
                        truncate_chars(text, diagnostic_chars),
                    )
                })
            })
            .await?;

        self.persist(run_id, stage, &invocation.output).await;
        Ok(invocation.map(WireframeArtifact::new))
    }

    async fn call<T, P>(
        &self,
        run_id: Uuid,
        stage: PipelineStage,
        request: &ModelRequest,
        parse: P,
    ) -> Result<Invocation<T>, StageFailure>
    where
        P: Fn(&str) -> Result<T, ExtractError>,
    {
        let timer = SpanTimer::start(stage.name());
        let model = &self.model;
        let parse = &parse;

        let result = with_retry(&self.policy, stage.name(), classify, move |attempt| async move {
            tracing::debug!(run_id = %run_id, stage = stage.name(), attempt, "Calling model");
            let text = model.generate(request).await.map_err(AttemptError::Model)?;
            parse(&text).map_err(|e| {
                tracing::warn!(
                    run_id = %run_id,
                    stage = stage.name(),
                    attempt,
                    error = %e,
                    "Malformed model output"
                );
                AttemptError::Malformed(e)
            })
        })
        .await;

        let duration_ms = timer.finish();
        let attributes = StageSpanAttributes::new(run_id, stage).with_duration_ms(duration_ms);

        match result {
            Ok(retried) => {
                attributes
                    .with_status("completed")
                    .with_attempts(retried.attempts)
                    .log();
                Ok(Invocation {
                    output: retried.value,
                    attempts: retried.attempts,
                    duration_ms,
                })
            }
            Err(error) => {
                let attempts = error.attempts();
                let failure = into_failure(error);
                attributes
                    .with_status("failed")
                    .with_attempts(attempts)
                    .with_error(failure.to_string())
                    .log();
                Err(failure)
            }
        }
    }

    async fn persist(&self, run_id: Uuid, stage: PipelineStage, content: &str) {
        let artifact = stage.artifact_name();
        if let Err(err) = self.store.put(run_id, artifact, content).await {
            tracing::warn!(
                run_id = %run_id,
                stage = stage.name(),
                artifact,
                error = %err,
                error_type = "StorageWriteFailed",
                "Failed to persist stage output"
            );
        }
    }
}

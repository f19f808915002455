//! Stage timing and structured completion logs.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

use crate::core::PipelineStage;

/// Attributes describing one stage execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSpanAttributes {
    /// The run.
    pub run_id: Uuid,
    /// The stage.
    pub stage: PipelineStage,
    /// `completed` or `failed`.
    pub status: Option<String>,
    /// Model calls made.
    pub attempts: Option<usize>,
    /// Duration in milliseconds.
    pub duration_ms: Option<f64>,
    /// Error message if failed.
    pub error: Option<String>,
}

impl StageSpanAttributes {
    /// Creates attributes for a stage of a run.
    #[must_use]
    pub fn new(run_id: Uuid, stage: PipelineStage) -> Self {
        Self {
            run_id,
            stage,
            status: None,
            attempts: None,
            duration_ms: None,
            error: None,
        }
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Sets the attempt count.
    #[must_use]
    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = Some(attempts);
        self
    }

    /// Sets the duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Sets the error.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Writes the attributes as one log line; failures log at warn.
    pub fn log(&self) {
        let stage = self.stage.name();
        let status = self.status.as_deref().unwrap_or("unknown");
        match &self.error {
            None => tracing::info!(
                run_id = %self.run_id,
                stage,
                status,
                attempts = self.attempts,
                duration_ms = self.duration_ms,
                "Stage finished"
            ),
            Some(error) => tracing::warn!(
                run_id = %self.run_id,
                stage,
                status,
                attempts = self.attempts,
                duration_ms = self.duration_ms,
                error = %error,
                "Stage failed"
            ),
        }
    }
}

/// Wall-clock timer for a named span.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Elapsed milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Stops the timer and returns elapsed milliseconds.
    #[must_use]
    pub fn finish(self) -> f64 {
        let elapsed_ms = self.elapsed_ms();
        tracing::trace!(span = %self.name, elapsed_ms, "Span finished");
        elapsed_ms
    }
}

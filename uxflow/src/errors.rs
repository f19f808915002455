//! Error types for uxflow.
//!
//! The taxonomy separates transport failures of the model call
//! ([`ModelError`], surfaced as `ModelCallFailed`) from output that could not
//! be parsed ([`ExtractError::MalformedOutput`]) and from a stage whose retry
//! budget ran out ([`StageFailure::StageOutputInvalid`]). Storage failures
//! ([`StoreError`]) never abort a run; they are logged by the caller.

use serde_json::{json, Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::core::{PipelineStage, RunState};

/// The crate-wide error type.
#[derive(Debug, Error)]
pub enum UxflowError {
    /// A pipeline run failed at a stage.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// A second-phase lookup named a run that does not exist.
    #[error("Run not found: {0}")]
    RunNotFound(String),

    /// Result store failure on a read the caller depends on.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Model client construction or configuration failure.
    #[error("{0}")]
    Model(#[from] ModelError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl UxflowError {
    /// Short type tag for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Pipeline(err) => err.source.kind(),
            Self::RunNotFound(_) => "RunNotFound",
            Self::Store(_) => "StorageError",
            Self::Model(_) => "ModelCallFailed",
            Self::Config(_) => "ConfigError",
            Self::Serialization(_) => "SerializationError",
            Self::Io(_) => "IoError",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> Map<String, Value> {
        if let Self::Pipeline(err) = self {
            return err.to_dict();
        }
        let mut map = Map::new();
        map.insert("type".to_string(), json!(self.kind()));
        map.insert("message".to_string(), json!(self.to_string()));
        map
    }
}

impl From<serde_json::Error> for UxflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// The extractor could not find a JSON object in model output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// No parseable JSON object was found.
    #[error("Malformed model output: {reason}")]
    MalformedOutput {
        /// Why the last candidate was rejected.
        reason: String,
        /// The raw model text, truncated for diagnostics.
        raw: String,
    },
}

impl ExtractError {
    /// Creates a malformed-output error.
    #[must_use]
    pub fn malformed(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::MalformedOutput {
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    /// The truncated raw text.
    #[must_use]
    pub fn raw(&self) -> &str {
        match self {
            Self::MalformedOutput { raw, .. } => raw,
        }
    }
}

/// Failures of the generative-model transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The API key environment variable is not set.
    #[error("Model API key not set: expected environment variable {var}")]
    MissingApiKey {
        /// The variable that was read.
        var: String,
    },

    /// The endpoint could not be reached.
    #[error("Cannot connect to model endpoint at {0}")]
    Connection(String),

    /// The request exceeded the configured timeout.
    #[error("Model request timed out after {0}s")]
    Timeout(u64),

    /// The endpoint answered with a non-success status.
    #[error("Model endpoint returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The response did not have the expected shape.
    #[error("Unexpected model response: {0}")]
    Response(String),

    /// Any other client failure.
    #[error("Model call failed: {0}")]
    Other(String),
}

/// Result store failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The artifact was already written for this run.
    #[error("Artifact '{artifact}' already exists for run {run_id}")]
    AlreadyExists {
        /// The run.
        run_id: Uuid,
        /// The artifact name.
        artifact: String,
    },

    /// The artifact name cannot be used as a key.
    #[error("Invalid artifact name: '{0}'")]
    InvalidArtifactName(String),

    /// Writing failed.
    #[error("Storage write failed for run {run_id}, artifact '{artifact}': {reason}")]
    WriteFailed {
        /// The run.
        run_id: Uuid,
        /// The artifact name.
        artifact: String,
        /// Underlying cause.
        reason: String,
    },

    /// Reading failed.
    #[error("Storage read failed for run {run_id}, artifact '{artifact}': {reason}")]
    ReadFailed {
        /// The run.
        run_id: Uuid,
        /// The artifact name.
        artifact: String,
        /// Underlying cause.
        reason: String,
    },
}

/// Why a single stage could not produce its output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageFailure {
    /// The model call itself failed. Not retried at this layer.
    #[error("Model call failed: {0}")]
    ModelCallFailed(#[from] ModelError),

    /// Every attempt returned output that could not be parsed.
    #[error("Stage output invalid after {attempts} attempt(s): {last_error}")]
    StageOutputInvalid {
        /// Model calls made.
        attempts: usize,
        /// The extractor error from the final attempt.
        last_error: ExtractError,
    },
}

impl StageFailure {
    /// Short type tag for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ModelCallFailed(_) => "ModelCallFailed",
            Self::StageOutputInvalid { .. } => "StageOutputInvalid",
        }
    }
}

/// A run failed at a specific stage. No artifacts are returned with it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Pipeline run {run_id} failed at stage '{stage}': {source}")]
pub struct PipelineError {
    /// The run that failed.
    pub run_id: Uuid,
    /// The stage that failed.
    pub stage: PipelineStage,
    /// What went wrong.
    #[source]
    pub source: StageFailure,
}

impl PipelineError {
    /// Creates a pipeline error.
    #[must_use]
    pub fn new(run_id: Uuid, stage: PipelineStage, source: StageFailure) -> Self {
        Self {
            run_id,
            stage,
            source,
        }
    }

    /// The transition the run failed to make.
    #[must_use]
    pub fn failed_transition(&self) -> RunState {
        RunState::after(self.stage)
    }

    /// The terminal state of the run.
    #[must_use]
    pub fn terminal_state(&self) -> RunState {
        RunState::Failed {
            stage: self.stage,
            reason: self.source.to_string(),
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("type".to_string(), json!(self.source.kind()));
        map.insert("run_id".to_string(), json!(self.run_id.to_string()));
        map.insert("stage".to_string(), json!(self.stage.name()));
        map.insert("step".to_string(), json!(self.stage.ordinal()));
        map.insert("message".to_string(), json!(self.source.to_string()));

        if let StageFailure::StageOutputInvalid { attempts, last_error } = &self.source {
            map.insert("attempts".to_string(), json!(attempts));
            map.insert("raw_output".to_string(), json!(last_error.raw()));
        }

        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_failure_kinds() {
        let transport = StageFailure::from(ModelError::Timeout(30));
        assert_eq!(transport.kind(), "ModelCallFailed");

        let invalid = StageFailure::StageOutputInvalid {
            attempts: 2,
            last_error: ExtractError::malformed("no object", "hello"),
        };
        assert_eq!(invalid.kind(), "StageOutputInvalid");
        assert!(invalid.to_string().contains("2 attempt(s)"));
    }

    #[test]
    fn test_pipeline_error_names_stage() {
        let run_id = Uuid::new_v4();
        let err = PipelineError::new(
            run_id,
            PipelineStage::Wireframe,
            ModelError::Connection("http://localhost".to_string()).into(),
        );

        assert!(err.to_string().contains("'wireframe'"));
        assert_eq!(err.failed_transition(), RunState::WireframeDone);
        assert!(err.terminal_state().is_failed());
    }

    #[test]
    fn test_pipeline_error_to_dict() {
        let err = PipelineError::new(
            Uuid::nil(),
            PipelineStage::Heuristics,
            StageFailure::StageOutputInvalid {
                attempts: 2,
                last_error: ExtractError::malformed("no object", "no json here"),
            },
        );
        let dict = err.to_dict();

        assert_eq!(dict["type"], "StageOutputInvalid");
        assert_eq!(dict["stage"], "heuristics");
        assert_eq!(dict["step"], 2);
        assert_eq!(dict["attempts"], 2);
        assert_eq!(dict["raw_output"], "no json here");
    }

    #[test]
    fn test_uxflow_error_to_dict() {
        let err = UxflowError::RunNotFound("abc".to_string());
        let dict = err.to_dict();
        assert_eq!(dict["type"], "RunNotFound");
        assert_eq!(dict["message"], "Run not found: abc");
    }

    #[test]
    fn test_serde_error_converts() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: UxflowError = parse.unwrap_err().into();
        assert_eq!(err.kind(), "SerializationError");
    }
}

//! # Uxflow
//!
//! A staged UX-critique pipeline for mobile UI screenshots.
//!
//! A screenshot goes through four generative-model stages, each consuming the
//! parsed output of the ones before it:
//!
//! - **Vision**: structured description of the screen's components
//! - **Heuristics**: evaluation against Nielsen's ten usability heuristics
//! - **Feedback**: prioritized, developer-facing recommendations
//! - **Wireframe**: an improved standalone HTML mockup
//!
//! Model output is free text; JSON is extracted from it tolerantly and a stage
//! whose output cannot be parsed is retried a bounded number of times. Stage
//! outputs are persisted per run, and callers can follow a run through
//! per-client progress notifications.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use uxflow::prelude::*;
//!
//! let config = PipelineConfig::default();
//! let model = Arc::new(GeminiClient::from_config(&config.model)?);
//! let store = Arc::new(FileResultStore::new(&config.output_dir));
//! let service = PipelineService::from_config(model, store, &config);
//!
//! let screenshot = ScreenshotRef::from_path("login.png").await?;
//! let (run_id, report) = service.evaluate(&screenshot, None).await?;
//! let wireframe = service.generate_wireframe(&run_id.to_string(), None).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod extract;
pub mod model;
pub mod observability;
pub mod pipeline;
pub mod render;
pub mod store;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ModelConfig, PipelineConfig};
    pub use crate::core::{
        EvaluationRecord, FeedbackReport, HeuristicEvaluation, PipelineRun, PipelineStage,
        RunState, ScreenshotRef, VisionAnalysis, WireframeArtifact,
    };
    pub use crate::errors::{
        ExtractError, ModelError, PipelineError, StageFailure, StoreError, UxflowError,
    };
    pub use crate::events::{
        EventSink, LoggingEventSink, NoOpEventSink, ProgressNotifier, ProgressSink,
    };
    pub use crate::extract::{clean_wireframe_html, extract_json_object, JsonExtractor};
    #[cfg(feature = "gemini")]
    pub use crate::model::gemini::GeminiClient;
    pub use crate::model::{GenerativeModel, ModelRequest};
    pub use crate::pipeline::{
        PipelineOrchestrator, PipelineService, PromptTemplates, RetryPolicy, RunOutcome,
        StageInvoker,
    };
    pub use crate::store::{FileResultStore, MemoryResultStore, ResultStore};
    pub use std::sync::Arc;
}

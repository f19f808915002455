//! Pipeline execution.
//!
//! This module provides:
//! - Bounded retry of model calls
//! - The stage invoker (call, extract, persist)
//! - Stage prompt templates
//! - The four-stage orchestrator
//! - A request-level service with the two-phase evaluate/wireframe flow

mod invoker;
mod orchestrator;
mod prompts;
mod retry;
mod service;

#[cfg(test)]
mod integration_tests;

pub use invoker::{Invocation, StageInvoker};
pub use orchestrator::{PipelineOrchestrator, RunOutcome};
pub use prompts::{
    Heuristic, PromptInputs, PromptTemplates, FEEDBACK_SLOT, HEURISTICS_SLOT,
    HEURISTIC_EVALUATION_SLOT, NIELSEN_HEURISTICS, VISION_ANALYSIS_SLOT,
};
pub use retry::{
    with_retry, BackoffStrategy, JitterStrategy, Retried, RetryClass, RetryError, RetryPolicy,
};
pub use service::PipelineService;

//! Testing utilities for uxflow pipelines.
//!
//! This module provides:
//! - Model doubles with scripted or prompt-routed replies
//! - Canned stage outputs and a sample screenshot
//! - Assertions on pipeline failures and progress

mod assertions;
pub mod fixtures;
mod mocks;

pub use assertions::{assert_failed_at, assert_progress_steps};
pub use mocks::{RoutedModel, ScriptedModel};

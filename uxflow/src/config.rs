//! Pipeline configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{ModelError, UxflowError};
use crate::extract::json::DEFAULT_DIAGNOSTIC_CHARS;
use crate::pipeline::RetryPolicy;

/// Model endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL of the generative language API.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_timeout_seconds() -> u64 {
    120
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            timeout_seconds: default_timeout_seconds(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl ModelConfig {
    /// Sets the API base URL.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Sets the model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// The request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Reads the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String, ModelError> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ModelError::MissingApiKey {
                var: self.api_key_env.clone(),
            }),
        }
    }
}

/// Settings for a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Retry policy applied to every stage.
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Directory for persisted run artifacts.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Characters of raw output kept in malformed-output diagnostics.
    #[serde(default = "default_diagnostic_truncate")]
    pub diagnostic_truncate: usize,
    /// Model endpoint settings.
    #[serde(default)]
    pub model: ModelConfig,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/outputs")
}

fn default_diagnostic_truncate() -> usize {
    DEFAULT_DIAGNOSTIC_CHARS
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            output_dir: default_output_dir(),
            diagnostic_truncate: default_diagnostic_truncate(),
            model: ModelConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON.
    pub fn from_json_str(text: &str) -> Result<Self, UxflowError> {
        serde_json::from_str(text).map_err(|e| UxflowError::Config(e.to_string()))
    }

    /// Reads a JSON configuration file.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, UxflowError> {
        let text = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_json_str(&text)
    }

    /// The per-stage attempt limit.
    #[must_use]
    pub fn max_attempts(&self) -> usize {
        self.retry.attempts()
    }

    /// Sets the per-stage attempt limit.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.retry.max_attempts = attempts;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Sets the model settings.
    #[must_use]
    pub fn with_model(mut self, model: ModelConfig) -> Self {
        self.model = model;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_attempts(), 2);
        assert_eq!(config.output_dir, PathBuf::from("data/outputs"));
        assert_eq!(config.diagnostic_truncate, 500);
        assert_eq!(config.model.model, "gemini-2.5-flash");
        assert_eq!(config.model.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_empty_json_is_default() {
        let config = PipelineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let config = PipelineConfig::from_json_str(
            r#"{"retry": {"max_attempts": 4}, "model": {"model": "gemini-2.5-pro"}}"#,
        )
        .unwrap();

        assert_eq!(config.max_attempts(), 4);
        assert_eq!(config.model.model, "gemini-2.5-pro");
        assert_eq!(config.model.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn test_invalid_json() {
        let err = PipelineConfig::from_json_str("{\"retry\": 3}").unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
    }

    #[test]
    fn test_missing_api_key() {
        let model = ModelConfig {
            api_key_env: "UXFLOW_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..ModelConfig::default()
        };
        assert_eq!(
            model.api_key().unwrap_err(),
            ModelError::MissingApiKey {
                var: "UXFLOW_TEST_KEY_THAT_IS_NEVER_SET".to_string()
            }
        );
    }

    #[test]
    fn test_builders() {
        let config = PipelineConfig::new()
            .with_max_attempts(3)
            .with_output_dir("/tmp/out")
            .with_model(ModelConfig::default().with_model("m").with_timeout_seconds(5));

        assert_eq!(config.max_attempts(), 3);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.model.model, "m");
        assert_eq!(config.model.timeout_seconds, 5);
    }
}

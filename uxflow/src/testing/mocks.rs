//! Model doubles for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::ModelError;
use crate::model::{GenerativeModel, ModelRequest};

type Reply = Result<String, ModelError>;

/// A model that replays a fixed script of replies in order.
///
/// Once the script is spent the model returns the repeat reply if one was
/// set, and a [`ModelError::Other`] otherwise.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    script: Mutex<VecDeque<Reply>>,
    repeat: Option<Reply>,
    requests: Mutex<Vec<ModelRequest>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedModel {
    /// Creates a model with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a model that returns each text once, in order.
    #[must_use]
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let model = Self::new();
        for text in texts {
            model.push_text(text);
        }
        model
    }

    /// Creates a model that returns the same reply forever.
    #[must_use]
    pub fn always(reply: Reply) -> Self {
        Self::new().with_repeat(reply)
    }

    /// Sets the reply used after the script is spent.
    #[must_use]
    pub fn with_repeat(mut self, reply: Reply) -> Self {
        self.repeat = Some(reply);
        self
    }

    /// Delays every reply.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Appends a text reply.
    pub fn push_text(&self, text: impl Into<String>) {
        self.script.lock().push_back(Ok(text.into()));
    }

    /// Appends an error reply.
    pub fn push_error(&self, error: ModelError) {
        self.script.lock().push_back(Err(error));
    }

    /// Number of `generate` calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().clone()
    }

    /// Replies not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn generate(&self, request: &ModelRequest) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().pop_front();
        next.or_else(|| self.repeat.clone())
            .unwrap_or_else(|| Err(ModelError::Other("script exhausted".to_string())))
    }
}

/// A model that answers by matching a marker in the prompt.
///
/// Rules are checked in insertion order; the first marker found in the
/// prompt selects the reply. Safe to share between concurrent runs.
#[derive(Debug, Default)]
pub struct RoutedModel {
    routes: Vec<(String, Reply)>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl RoutedModel {
    /// Creates a model with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers prompts containing `marker` with `reply`.
    #[must_use]
    pub fn route(mut self, marker: impl Into<String>, reply: Reply) -> Self {
        self.routes.push((marker.into(), reply));
        self
    }

    /// Delays every reply.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `generate` calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeModel for RoutedModel {
    async fn generate(&self, request: &ModelRequest) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.routes
            .iter()
            .find(|(marker, _)| request.prompt.contains(marker.as_str()))
            .map_or_else(
                || Err(ModelError::Other("no route for prompt".to_string())),
                |(_, reply)| reply.clone(),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_model_replays_in_order() {
        let model = ScriptedModel::from_texts(["one", "two"]);
        let request = ModelRequest::text("p");

        assert_eq!(model.generate(&request).await.unwrap(), "one");
        assert_eq!(model.generate(&request).await.unwrap(), "two");
        assert!(model.generate(&request).await.is_err());
        assert_eq!(model.call_count(), 3);
        assert_eq!(model.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_scripted_model_repeat() {
        let model = ScriptedModel::always(Err(ModelError::Timeout(5)));
        let request = ModelRequest::text("p");

        for _ in 0..3 {
            assert_eq!(model.generate(&request).await, Err(ModelError::Timeout(5)));
        }
        assert_eq!(model.remaining(), 0);
    }

    #[tokio::test]
    async fn test_routed_model() {
        let model = RoutedModel::new()
            .route("alpha", Ok("A".to_string()))
            .route("beta", Ok("B".to_string()));

        assert_eq!(model.generate(&ModelRequest::text("x beta y")).await.unwrap(), "B");
        assert_eq!(model.generate(&ModelRequest::text("alpha beta")).await.unwrap(), "A");
        assert!(model.generate(&ModelRequest::text("gamma")).await.is_err());
        assert_eq!(model.call_count(), 3);
    }
}

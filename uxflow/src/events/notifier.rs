//! Per-client progress delivery.
//!
//! Clients register under an id and receive [`ProgressEvent`]s on their own
//! channel. The registry is owned by whoever builds the pipeline and shared
//! by handle; notifying is safe from any task or thread.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Status carried by every step-completion event.
pub const STATUS_PROCESSING: &str = "processing";

/// One step-completion notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Human-readable message.
    pub message: String,
    /// Step ordinal, 1 to 4.
    pub step: u8,
    /// Always `processing`.
    pub status: String,
}

impl ProgressEvent {
    /// Creates a processing event.
    #[must_use]
    pub fn new(message: impl Into<String>, step: u8) -> Self {
        Self {
            message: message.into(),
            step,
            status: STATUS_PROCESSING.to_string(),
        }
    }
}

/// Anything progress can be pushed to.
///
/// `notify` is fire-and-forget: it must not fail and must not block.
pub trait ProgressSink: Send + Sync {
    /// Delivers `message` for `step` to `client_id`, if it is listening.
    fn notify(&self, client_id: &str, message: &str, step: u8);
}

/// Drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgressSink;

impl ProgressSink for NoOpProgressSink {
    fn notify(&self, _client_id: &str, _message: &str, _step: u8) {}
}

/// The receiving end of a registration.
///
/// Dropping it disconnects the client.
#[derive(Debug)]
pub struct ProgressSubscription {
    client_id: String,
    receiver: mpsc::UnboundedReceiver<ProgressEvent>,
}

impl ProgressSubscription {
    /// The registered client id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Waits for the next event. `None` once the client was unregistered.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.receiver.recv().await
    }

    /// Returns an event if one is ready.
    pub fn try_recv(&mut self) -> Option<ProgressEvent> {
        self.receiver.try_recv().ok()
    }

    /// Drains every event that is ready.
    pub fn drain(&mut self) -> Vec<ProgressEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

/// Registry of connected clients.
#[derive(Debug, Default)]
pub struct ProgressNotifier {
    clients: DashMap<String, mpsc::UnboundedSender<ProgressEvent>>,
}

impl ProgressNotifier {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client, replacing any earlier registration under the id.
    pub fn register(&self, client_id: impl Into<String>) -> ProgressSubscription {
        let client_id = client_id.into();
        let (sender, receiver) = mpsc::unbounded_channel();
        if self.clients.insert(client_id.clone(), sender).is_some() {
            tracing::debug!(client_id = %client_id, "Replaced progress registration");
        }
        ProgressSubscription {
            client_id,
            receiver,
        }
    }

    /// Removes a client. Returns whether it was registered.
    pub fn unregister(&self, client_id: &str) -> bool {
        self.clients.remove(client_id).is_some()
    }

    /// Whether a client is registered.
    #[must_use]
    pub fn is_registered(&self, client_id: &str) -> bool {
        self.clients.contains_key(client_id)
    }

    /// Number of registered clients.
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }
}

impl ProgressSink for ProgressNotifier {
    fn notify(&self, client_id: &str, message: &str, step: u8) {
        let sender = match self.clients.get(client_id) {
            Some(entry) => entry.value().clone(),
            None => {
                tracing::trace!(client_id, step, "No progress subscriber");
                return;
            }
        };

        if sender.send(ProgressEvent::new(message, step)).is_err() {
            tracing::debug!(client_id, step, "Progress subscriber disconnected; pruning");
            self.clients
                .remove_if(client_id, |_, current| current.same_channel(&sender));
        }
    }
}

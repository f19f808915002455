//! Run observation: lifecycle events and per-client progress.
//!
//! Two channels leave a run. [`EventSink`] receives every lifecycle event
//! for logging and analytics; [`ProgressSink`] pushes step-completion
//! notices to the client that started the run.

mod lifecycle;
mod notifier;
mod sink;

pub use lifecycle::{EventKind, PipelineEvent};
pub use notifier::{
    NoOpProgressSink, ProgressEvent, ProgressNotifier, ProgressSink, ProgressSubscription,
    STATUS_PROCESSING,
};
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

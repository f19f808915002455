//! Human-readable renderings of run artifacts.

mod markdown;

pub use markdown::feedback_markdown;

//! Heuristic email classification and todo extraction.
//!
//! Takes raw subject/body/sender text and produces a category
//! classification plus a deduplicated list of action items with
//! priorities, due dates and confidence scores. Pure keyword/pattern
//! scoring; no model calls, no I/O.

pub mod batch;
pub mod classify;
pub mod config;
pub mod error;
pub mod message;
pub mod newsletter;
pub mod patterns;
pub mod todo;

pub use batch::{BatchCoordinator, ProcessingOutcome};
pub use classify::{ClassificationResult, Classifier};
pub use config::{ProcessingConfig, ProcessingConfigUpdate, SharedConfig};
pub use error::{AppError, AppResult};
pub use message::EmailMessage;
pub use newsletter::{detect as detect_newsletter, NewsletterDetection};
pub use patterns::EmailCategory;
pub use todo::{Priority, TodoExtractionResult, TodoExtractor, TodoItem, TodoStatus};

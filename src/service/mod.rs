//! Service layer
//!
//! The upload orchestrator and its progress-reporting seam.

pub mod progress;
pub mod upload;

pub use progress::{ChannelProgressSink, ProgressSink, TracingProgressSink};
pub use upload::UploadOrchestrator;

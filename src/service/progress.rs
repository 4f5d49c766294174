//! Progress reporting
//!
//! The orchestrator emits exactly one event before each stage's work and
//! a terminal event on completion or failure. Callers choose where the
//! events go: log lines for the CLI, a channel for UIs and tests.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::data::models::{ProgressEvent, ProgressKind};

/// Destination for progress events
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn emit(&self, event: ProgressEvent);
}

/// Renders progress events as log lines
pub struct TracingProgressSink;

#[async_trait]
impl ProgressSink for TracingProgressSink {
    async fn emit(&self, event: ProgressEvent) {
        match event.kind {
            ProgressKind::Error => {
                tracing::error!(percent = event.percent, "{}", event.message)
            }
            _ => tracing::info!(percent = event.percent, "{}", event.message),
        }
    }
}

/// Forwards progress events over an unbounded channel.
///
/// Dropped receivers are tolerated; progress must never fail an upload.
pub struct ChannelProgressSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgressSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ProgressSink for ChannelProgressSink {
    async fn emit(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::{MediaKind, UploadStage};

    #[test]
    fn channel_sink_delivers_events_in_order() {
        tokio_test::block_on(async {
            let (sink, mut rx) = ChannelProgressSink::new();

            sink.emit(ProgressEvent::stage(UploadStage::Processing, MediaKind::Image))
                .await;
            sink.emit(ProgressEvent::stage(UploadStage::Completed, MediaKind::Image))
                .await;

            let first = rx.recv().await.unwrap();
            let second = rx.recv().await.unwrap();
            assert_eq!(first.stage, UploadStage::Processing);
            assert_eq!(second.stage, UploadStage::Completed);
        });
    }

    #[test]
    fn channel_sink_survives_dropped_receiver() {
        tokio_test::block_on(async {
            let (sink, rx) = ChannelProgressSink::new();
            drop(rx);

            // Must not panic or error
            sink.emit(ProgressEvent::stage(UploadStage::Processing, MediaKind::Image))
                .await;
        });
    }
}

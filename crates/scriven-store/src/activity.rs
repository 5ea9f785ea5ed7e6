//! Activity sink implementations.
//!
//! Lifecycle operations emit [`ActivityRecord`]s fire-and-forget; a slow
//! or failing sink must never delay or fail the emitting operation.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use scriven_core::{ActivityRecord, ActivitySink};

/// Sink that buffers records in memory. Used by tests to assert on
/// emitted activity.
#[derive(Clone, Default)]
pub struct BufferingActivitySink {
    records: Arc<Mutex<Vec<ActivityRecord>>>,
}

impl BufferingActivitySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<ActivityRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl ActivitySink for BufferingActivitySink {
    async fn record(&self, activity: ActivityRecord) {
        self.records.lock().await.push(activity);
    }
}

/// Sink that forwards records to an unbounded channel consumed by an
/// external collaborator. A closed receiver drops records silently.
pub struct ChannelActivitySink {
    tx: mpsc::UnboundedSender<ActivityRecord>,
}

impl ChannelActivitySink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ActivityRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ActivitySink for ChannelActivitySink {
    async fn record(&self, activity: ActivityRecord) {
        if self.tx.send(activity).is_err() {
            debug!("activity receiver closed, record dropped");
        }
    }
}

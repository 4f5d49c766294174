//! Draft state
//!
//! Holds the user's in-progress post. The orchestrator only sees the
//! narrow `DraftSink` contract: read the current draft, clear it after a
//! completed attempt. A failed attempt never touches the draft, so a
//! retry reuses the user's input.

use std::sync::Mutex;

use crate::data::models::Draft;

/// Narrow draft contract the orchestrator depends on
pub trait DraftSink: Send + Sync {
    /// Snapshot of the current draft, if any
    fn current(&self) -> Option<Draft>;

    /// Drop the draft (called once on a completed attempt)
    fn clear(&self);
}

/// In-memory draft store
///
/// Single-consumer by contract: one UI, one attempt at a time.
#[derive(Default)]
pub struct DraftStore {
    inner: Mutex<Option<Draft>>,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the draft with new user input
    pub fn set(&self, draft: Draft) {
        *self.inner.lock().expect("draft lock poisoned") = Some(draft);
    }
}

impl DraftSink for DraftStore {
    fn current(&self) -> Option<Draft> {
        self.inner.lock().expect("draft lock poisoned").clone()
    }

    fn clear(&self) {
        *self.inner.lock().expect("draft lock poisoned") = None;
    }
}

//! Object naming and paths
//!
//! Objects live under `users/<owner>/moments/{videos|thumbnails}/` and are
//! named `<epoch-millis>_<purpose>.<ext>`. Every attempt derives fresh
//! names, so retries never overwrite earlier objects.

use std::sync::atomic::{AtomicU64, Ordering};

/// What the object holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectPurpose {
    /// Primary media of the post
    Moment,
    /// Derived still-frame thumbnail
    Thumbnail,
}

impl ObjectPurpose {
    fn as_str(&self) -> &'static str {
        match self {
            ObjectPurpose::Moment => "moment",
            ObjectPurpose::Thumbnail => "thumbnail",
        }
    }
}

/// Storage subtree an object is filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageArea {
    /// Images and derived thumbnails
    Thumbnails,
    /// Video payloads
    Videos,
}

impl StorageArea {
    fn segment(&self) -> &'static str {
        match self {
            StorageArea::Thumbnails => "thumbnails",
            StorageArea::Videos => "videos",
        }
    }
}

// Names are epoch-millis based. Two attempts inside the same millisecond
// must still get distinct names, so the tick is forced strictly monotonic.
static LAST_TICK: AtomicU64 = AtomicU64::new(0);

fn next_tick() -> u64 {
    let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
    let mut last = LAST_TICK.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_TICK.compare_exchange_weak(
            last,
            candidate,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return candidate,
            Err(observed) => last = observed,
        }
    }
}

/// Derive a fresh object name: `<epoch-millis>_<purpose>.<ext>`
pub fn object_name(purpose: ObjectPurpose, extension: &str) -> String {
    format!("{}_{}.{}", next_tick(), purpose.as_str(), extension)
}

/// Full object path for an owner: `users/<owner>/moments/<area>/<name>`
pub fn object_path(owner_id: &str, area: StorageArea, name: &str) -> String {
    format!("users/{}/moments/{}/{}", owner_id, area.segment(), name)
}

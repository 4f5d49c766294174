//! Domain models and draft state
//!
//! - `models`: the data the pipeline moves around (media assets, upload
//!   descriptors, progress events)
//! - `draft`: the user's in-progress post, preserved across failed attempts

pub mod draft;
pub mod models;

pub use draft::{DraftSink, DraftStore};
pub use models::{
    Draft, MediaAsset, MediaKind, PostId, ProgressEvent, ProgressKind, UploadDescriptor,
    UploadStage,
};

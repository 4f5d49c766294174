//! Object storage
//!
//! Resumable-upload client and the object naming/path conventions of the
//! moments storage layout.

pub mod object;
pub mod resumable;

pub use object::{ObjectPurpose, StorageArea, object_name, object_path};
pub use resumable::ResumableUploadClient;

//! Moment backend API
//!
//! Registration of a finished upload as a new moment post.

pub mod registrar;

pub use registrar::MomentRegistrar;

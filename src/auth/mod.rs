//! Authentication
//!
//! Identity-provider client (password login, token refresh, account info)
//! and the session-backed token source the upload pipeline consumes.

pub mod identity;
pub mod session;
pub mod token;

pub use identity::IdentityClient;
pub use session::Session;
pub use token::{SessionTokenSource, TokenSource};

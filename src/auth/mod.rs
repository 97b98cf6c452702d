//! Authentication types.
//!
//! - [`AuthScopes`]: requested and granted capability scopes
//! - [`Session`]: an authenticated shop session holding the host credential
//! - [`oauth`]: the authorization-code handshake
//!
//! # Example
//!
//! ```rust
//! use shop_handshake::AuthScopes;
//!
//! let scopes: AuthScopes = "write_products".parse().unwrap();
//! assert!(scopes.covers(&"read_products".parse().unwrap()));
//! ```

pub mod oauth;
mod scopes;
pub mod session;

pub use scopes::AuthScopes;
pub use session::{Session, SessionId, SessionSummary};

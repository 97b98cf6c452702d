//! The authorization-code handshake with the host platform.
//!
//! # Flow
//!
//! 1. **Start** ([`begin_auth`]): validate the claimed shop, mint a
//!    [`StateParam`], record a [`PendingHandshake`] and redirect the browser
//!    to the host's authorization page.
//! 2. **Callback** ([`validate_auth_callback`]): check parameters, tenant,
//!    state and signature locally, then redeem the code through a
//!    [`CredentialExchanger`].
//!
//! # Security
//!
//! - Nonces are 256-bit CSPRNG values, single-use and short-lived
//! - Signatures and nonces are compared in constant time
//! - The previous client secret is accepted during key rotation
//! - No step after a failed check runs; nothing reaches the host before the
//!   local checks pass

mod begin_auth;
mod callback_query;
mod error;
pub mod hmac;
mod state;
mod token_exchange;
mod validate_callback;

pub use begin_auth::{begin_auth, BeginAuthResult};
pub use callback_query::{CallbackQuery, RequiredParams};
pub use error::{ExchangeFailureKind, HandshakeError};
pub use hmac::{compute_signature, constant_time_compare, validate_hmac};
pub use state::{PendingHandshake, StateParam};
pub use token_exchange::{CredentialExchanger, ExchangeFailure, HttpCredentialExchanger};
pub use validate_callback::validate_auth_callback;

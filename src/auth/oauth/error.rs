//! Handshake error types.
//!
//! Every failure of the handshake or the session gate is a [`HandshakeError`].
//! Each variant has a stable wire name ([`HandshakeError::wire_name`]) and a
//! user-facing message (its `Display`), neither of which ever contains the
//! credential, the client secret, or an upstream response body.
//!
//! # Example
//!
//! ```rust
//! use shop_handshake::auth::oauth::{ExchangeFailureKind, HandshakeError};
//!
//! let error = HandshakeError::CredentialExchangeFailed(ExchangeFailureKind::Transient);
//! assert_eq!(error.wire_name(), "CredentialExchangeFailed/Transient");
//! assert!(error.to_string().contains("/auth/start"));
//! ```

use crate::store::StoreError;
use thiserror::Error;

/// Why the credential exchange failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeFailureKind {
    /// The host answered 4xx: the code is invalid, used, or not ours.
    Rejected,
    /// 5xx, network error, timeout, or an unreadable success body.
    Transient,
}

impl ExchangeFailureKind {
    /// Returns the suffix used in the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rejected => "Rejected",
            Self::Transient => "Transient",
        }
    }

    const fn message(self) -> &'static str {
        match self {
            Self::Rejected => "The shop rejected the authorization code. Please start again.",
            Self::Transient => {
                "The shop could not be reached to complete login. Please retry from /auth/start."
            }
        }
    }
}

/// Errors produced by the handshake and the session gate.
///
/// All variants are terminal for the current request; nothing is retried
/// server-side.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The tenant identifier does not match the platform's domain grammar.
    #[error("The shop parameter is not a valid shop domain.")]
    InvalidTenant,

    /// A required callback parameter is missing, empty, or repeated.
    #[error("The callback is missing one of the required parameters: shop, code, state, hmac.")]
    MissingParameters,

    /// No live pending handshake matches the supplied state and shop.
    #[error("The login attempt is unknown, already used, or expired. Please start again.")]
    InvalidOrExpiredState,

    /// The callback signature does not verify.
    #[error("The request signature could not be verified.")]
    SignatureInvalid,

    /// The server-to-server credential exchange failed.
    #[error("{}", .0.message())]
    CredentialExchangeFailed(ExchangeFailureKind),

    /// No session is associated with the request.
    #[error("No active session. Please log in.")]
    SessionNotFound,

    /// The session has expired.
    #[error("The session has expired. Please log in again.")]
    SessionExpired,

    /// A store operation failed.
    #[error("Internal storage error.")]
    Store(#[from] StoreError),
}

impl HandshakeError {
    /// Stable identifier placed in the `error` field of JSON bodies.
    #[must_use]
    pub const fn wire_name(&self) -> &'static str {
        match self {
            Self::InvalidTenant => "InvalidTenant",
            Self::MissingParameters => "MissingParameters",
            Self::InvalidOrExpiredState => "InvalidOrExpiredState",
            Self::SignatureInvalid => "SignatureInvalid",
            Self::CredentialExchangeFailed(ExchangeFailureKind::Rejected) => {
                "CredentialExchangeFailed/Rejected"
            }
            Self::CredentialExchangeFailed(ExchangeFailureKind::Transient) => {
                "CredentialExchangeFailed/Transient"
            }
            Self::SessionNotFound => "SessionNotFound",
            Self::SessionExpired => "SessionExpired",
            Self::Store(_) => "Store",
        }
    }

    /// Returns `true` for the unauthenticated outcomes of the session gate.
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::SessionNotFound | Self::SessionExpired)
    }
}

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HandshakeError>();
};

//! Authenticated shop sessions.
//!
//! A [`Session`] is created at the end of a successful handshake and is the
//! only place the host's access credential lives. The browser only ever sees
//! the opaque [`SessionId`].

use crate::auth::AuthScopes;
use crate::config::ShopDomain;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const SESSION_ID_BYTES: usize = 32;

/// Opaque session identifier carried in the session cookie.
///
/// 256 bits from the OS CSPRNG, URL-safe base64 without padding. Debug
/// output only shows a short prefix so ids never land in logs whole.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a fresh random session id.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wraps a value read back from a cookie. No validation beyond non-emptiness;
    /// an unknown id simply misses the store.
    #[must_use]
    pub fn from_cookie(value: &str) -> Option<Self> {
        let value = value.trim();
        (!value.is_empty()).then(|| Self(value.to_string()))
    }

    /// Returns the id as it is written into the cookie.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix safe to put in log fields.
    #[must_use]
    pub fn redacted(&self) -> &str {
        self.0.get(..6).unwrap_or(&self.0)
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({}…)", self.redacted())
    }
}

/// Body returned by the host's token endpoint.
///
/// Unknown fields (such as `associated_user` for online tokens) are ignored.
#[derive(Clone, Deserialize)]
pub struct AccessTokenResponse {
    /// The access credential.
    pub access_token: String,
    /// Scopes actually granted.
    #[serde(default)]
    pub scope: AuthScopes,
    /// Credential lifetime in seconds, present for online tokens.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl fmt::Debug for AccessTokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("scope", &self.scope)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// An authenticated session for one shop.
#[derive(Clone)]
pub struct Session {
    /// Opaque id, also the store key.
    pub id: SessionId,
    /// The shop this session is for.
    pub shop: ShopDomain,
    credential: SecretString,
    /// Scopes granted by the host.
    pub scopes: AuthScopes,
    /// When the session was issued.
    pub issued_at: DateTime<Utc>,
    /// When the session stops being valid.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Builds a session from a successful credential exchange.
    ///
    /// `expires_at` is `issued_at + ttl`, clamped to the credential's own
    /// lifetime when the host reports one.
    #[must_use]
    pub fn from_access_token_response(
        shop: ShopDomain,
        response: AccessTokenResponse,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let ttl = response
            .expires_in
            .map_or(ttl, |secs| ttl.min(Duration::from_secs(secs)));
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| issued_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            id: SessionId::generate(),
            shop,
            credential: SecretString::from(response.access_token),
            scopes: response.scope,
            issued_at,
            expires_at,
        }
    }

    /// Returns the access credential for server-side calls to the host.
    #[must_use]
    pub fn credential(&self) -> &str {
        self.credential.expose_secret()
    }

    /// Returns `true` if the session is expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Returns the lifetime left at `now`, zero if already expired.
    #[must_use]
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }

    /// Browser-safe view of the session.
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            shop: self.shop.clone(),
            scopes: self.scopes.clone(),
            issued_at: self.issued_at,
            expires_at: self.expires_at,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("shop", &self.shop)
            .field("credential", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Session>();
};

/// The parts of a session that may be shown to the browser.
#[derive(Clone, Debug, Serialize)]
pub struct SessionSummary {
    /// The shop the session belongs to.
    pub shop: ShopDomain,
    /// Granted scopes.
    pub scopes: AuthScopes,
    /// Issue time.
    pub issued_at: DateTime<Utc>,
    /// Expiry time.
    pub expires_at: DateTime<Utc>,
}

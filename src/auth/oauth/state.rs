//! Anti-forgery state for the handshake.
//!
//! [`StateParam`] is the one-time nonce sent to the host in the authorization
//! redirect and mirrored in a short-lived cookie. [`PendingHandshake`] is the
//! server-side record binding that nonce to the shop that started the
//! handshake.

use crate::config::ShopDomain;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use std::time::Duration;

const STATE_BYTES: usize = 32;

/// A single-use anti-forgery nonce.
///
/// 256 bits from the OS CSPRNG, encoded as URL-safe base64 without padding
/// so it can travel in a query string and a cookie unescaped.
///
/// # Example
///
/// ```rust
/// use shop_handshake::auth::oauth::StateParam;
///
/// let a = StateParam::generate();
/// let b = StateParam::generate();
/// assert_ne!(a, b);
/// assert_eq!(a.as_ref().len(), 43);
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StateParam(String);

impl StateParam {
    /// Generates a fresh nonce.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; STATE_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wraps a state value received from the host.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl AsRef<str> for StateParam {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StateParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = self.0.get(..6).unwrap_or(&self.0);
        write!(f, "StateParam({prefix}…)")
    }
}

/// A handshake that has started but not yet completed.
///
/// Expiry is checked lazily from `created_at`; a record past its TTL is
/// invalid even when its state matches.
#[derive(Clone, Debug)]
pub struct PendingHandshake {
    /// The shop that started the handshake.
    pub shop: ShopDomain,
    /// The nonce issued for it.
    pub state: StateParam,
    /// When the handshake started.
    pub created_at: DateTime<Utc>,
}

impl PendingHandshake {
    /// Creates a pending record for `shop` with a fresh nonce.
    #[must_use]
    pub fn start(shop: ShopDomain, now: DateTime<Utc>) -> Self {
        Self {
            shop,
            state: StateParam::generate(),
            created_at: now,
        }
    }

    /// Returns `true` if the record is older than `ttl` at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| self.created_at.checked_add_signed(ttl))
            .is_some_and(|deadline| now >= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlatformDomain;
    use std::collections::HashSet;

    fn shop() -> ShopDomain {
        ShopDomain::parse("acme.myshopify.com", &PlatformDomain::default()).unwrap()
    }

    #[test]
    fn test_generate_is_url_safe_and_unique() {
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let state = StateParam::generate();
            assert!(state
                .as_ref()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
            assert!(seen.insert(state));
        }
    }

    #[test]
    fn test_debug_does_not_print_full_state() {
        let state = StateParam::generate();
        assert!(!format!("{state:?}").contains(state.as_ref()));
    }

    #[test]
    fn test_pending_expiry_is_measured_from_creation() {
        let created = Utc::now();
        let pending = PendingHandshake {
            shop: shop(),
            state: StateParam::generate(),
            created_at: created,
        };
        let ttl = Duration::from_secs(600);

        assert!(!pending.is_expired_at(created, ttl));
        assert!(!pending.is_expired_at(created + chrono::Duration::seconds(599), ttl));
        assert!(pending.is_expired_at(created + chrono::Duration::seconds(600), ttl));
    }

    #[test]
    fn test_start_records_shop_and_time() {
        let now = Utc::now();
        let pending = PendingHandshake::start(shop(), now);
        assert_eq!(pending.shop, shop());
        assert_eq!(pending.created_at, now);
    }
}

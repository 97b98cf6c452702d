//! Authorization redirect construction.
//!
//! [`begin_auth`] is the pure half of starting a handshake: it mints the
//! nonce and builds the host's authorization URL. Persisting the pending
//! record and setting the cookie are done by the caller.

use chrono::{DateTime, Utc};

use crate::auth::oauth::state::PendingHandshake;
use crate::config::{HandshakeConfig, ShopDomain};

/// Result of starting a handshake.
#[derive(Clone, Debug)]
pub struct BeginAuthResult {
    /// Where to send the browser.
    pub auth_url: String,
    /// The record to persist until the callback arrives.
    pub pending: PendingHandshake,
}

/// Starts a handshake for an already-validated shop.
///
/// The URL points at `https://{shop}/admin/oauth/authorize` and carries
/// `client_id`, `scope`, `redirect_uri` and `state`, plus
/// `grant_options[]=per-user` when online access is configured.
///
/// # Example
///
/// ```rust
/// use chrono::Utc;
/// use shop_handshake::auth::oauth::begin_auth;
/// use shop_handshake::{ApiKey, ApiSecretKey, HandshakeConfig, HostUrl};
///
/// let config = HandshakeConfig::builder()
///     .api_key(ApiKey::new("client-id").unwrap())
///     .api_secret_key(ApiSecretKey::new("secret").unwrap())
///     .callback_url(HostUrl::new("https://app.example.com/auth/callback").unwrap())
///     .scopes("write_products".parse().unwrap())
///     .build()
///     .unwrap();
/// let shop = config.parse_shop("acme.myshopify.com").unwrap();
///
/// let result = begin_auth(&config, &shop, Utc::now());
/// assert!(result
///     .auth_url
///     .starts_with("https://acme.myshopify.com/admin/oauth/authorize?"));
/// assert!(result.auth_url.contains(result.pending.state.as_ref()));
/// ```
#[must_use]
pub fn begin_auth(
    config: &HandshakeConfig,
    shop: &ShopDomain,
    now: DateTime<Utc>,
) -> BeginAuthResult {
    let pending = PendingHandshake::start(shop.clone(), now);

    let mut params = vec![
        ("client_id", config.api_key().as_ref().to_string()),
        ("scope", config.scopes().to_string()),
        ("redirect_uri", config.callback_url().as_ref().to_string()),
        ("state", pending.state.as_ref().to_string()),
    ];
    if config.online_access() {
        params.push(("grant_options[]", "per-user".to_string()));
    }

    let query_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    BeginAuthResult {
        auth_url: format!("https://{shop}/admin/oauth/authorize?{query_string}"),
        pending,
    }
}

//! Configuration types for the shop handshake.
//!
//! # Overview
//!
//! - [`HandshakeConfig`]: app credentials, requested scopes, callback URL and
//!   the lifetimes that govern pending handshakes and sessions
//! - [`HandshakeConfigBuilder`]: fluent builder with validation on `build`
//! - [`ServerConfig`]: bind address for the binary
//! - [`ApiKey`], [`ApiSecretKey`], [`ShopDomain`], [`PlatformDomain`],
//!   [`HostUrl`]: validated newtypes
//!
//! # Example
//!
//! ```rust
//! use shop_handshake::{ApiKey, ApiSecretKey, HandshakeConfig, HostUrl};
//!
//! let config = HandshakeConfig::builder()
//!     .api_key(ApiKey::new("my-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("my-secret").unwrap())
//!     .callback_url(HostUrl::new("https://app.example.com/auth/callback").unwrap())
//!     .scopes("write_products".parse().unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.platform_domain().as_ref(), "myshopify.com");
//! ```

mod env;
mod newtypes;

pub use env::ServerConfig;
pub use newtypes::{ApiKey, ApiSecretKey, HostUrl, PlatformDomain, ShopDomain};

use crate::auth::AuthScopes;
use crate::error::ConfigError;
use std::time::Duration;

/// Default lifetime of a pending handshake (10 minutes).
pub const DEFAULT_STATE_TTL: Duration = Duration::from_secs(600);

/// Default lifetime of a session (24 hours).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(86_400);

/// Default timeout of the server-to-server credential exchange.
pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the shop handshake.
///
/// `HandshakeConfig` is `Clone`, `Send`, and `Sync`; it is built once at
/// startup and shared by every request.
///
/// # Key Rotation
///
/// When `old_api_secret_key` is set, signature checks try the current secret
/// first and fall back to the old one, so callbacks signed just before a
/// rotation still verify.
#[derive(Clone, Debug)]
pub struct HandshakeConfig {
    api_key: ApiKey,
    api_secret_key: ApiSecretKey,
    old_api_secret_key: Option<ApiSecretKey>,
    scopes: AuthScopes,
    callback_url: HostUrl,
    platform_domain: PlatformDomain,
    state_ttl: Duration,
    session_ttl: Duration,
    exchange_timeout: Duration,
    secure_cookies: bool,
    online_access: bool,
}

impl HandshakeConfig {
    /// Creates a new builder for constructing a `HandshakeConfig`.
    #[must_use]
    pub fn builder() -> HandshakeConfigBuilder {
        HandshakeConfigBuilder::new()
    }

    /// Returns the app's client id.
    #[must_use]
    pub const fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Returns the app's client secret.
    #[must_use]
    pub const fn api_secret_key(&self) -> &ApiSecretKey {
        &self.api_secret_key
    }

    /// Returns the previous client secret, if a rotation is in progress.
    #[must_use]
    pub const fn old_api_secret_key(&self) -> Option<&ApiSecretKey> {
        self.old_api_secret_key.as_ref()
    }

    /// Returns the scopes requested at authorization time.
    #[must_use]
    pub const fn scopes(&self) -> &AuthScopes {
        &self.scopes
    }

    /// Returns the absolute URL the host redirects back to.
    #[must_use]
    pub const fn callback_url(&self) -> &HostUrl {
        &self.callback_url
    }

    /// Returns the platform domain tenants must live under.
    #[must_use]
    pub const fn platform_domain(&self) -> &PlatformDomain {
        &self.platform_domain
    }

    /// Returns how long a pending handshake stays valid.
    #[must_use]
    pub const fn state_ttl(&self) -> Duration {
        self.state_ttl
    }

    /// Returns how long a session stays valid.
    #[must_use]
    pub const fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Returns the timeout applied to the credential exchange.
    #[must_use]
    pub const fn exchange_timeout(&self) -> Duration {
        self.exchange_timeout
    }

    /// Returns whether cookies carry the `Secure` attribute.
    #[must_use]
    pub const fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    /// Returns whether per-user (online) access is requested.
    #[must_use]
    pub const fn online_access(&self) -> bool {
        self.online_access
    }

    /// Validates a claimed tenant identifier against the configured platform.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidShopDomain`] if `shop` does not match
    /// the tenant grammar.
    pub fn parse_shop(&self, shop: &str) -> Result<ShopDomain, ConfigError> {
        ShopDomain::parse(shop, &self.platform_domain)
    }
}

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HandshakeConfig>();
};

/// Builder for constructing [`HandshakeConfig`] instances.
///
/// Required fields are `api_key`, `api_secret_key`, `callback_url` and
/// `scopes`.
///
/// # Defaults
///
/// - `platform_domain`: `myshopify.com`
/// - `state_ttl`: 10 minutes
/// - `session_ttl`: 24 hours
/// - `exchange_timeout`: 10 seconds
/// - `secure_cookies`: `true`
/// - `online_access`: `false`
#[derive(Debug, Default)]
pub struct HandshakeConfigBuilder {
    api_key: Option<ApiKey>,
    api_secret_key: Option<ApiSecretKey>,
    old_api_secret_key: Option<ApiSecretKey>,
    scopes: Option<AuthScopes>,
    callback_url: Option<HostUrl>,
    platform_domain: Option<PlatformDomain>,
    state_ttl: Option<Duration>,
    session_ttl: Option<Duration>,
    exchange_timeout: Option<Duration>,
    secure_cookies: Option<bool>,
    online_access: Option<bool>,
}

impl HandshakeConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the client id (required).
    #[must_use]
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the client secret (required).
    #[must_use]
    pub fn api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.api_secret_key = Some(key);
        self
    }

    /// Sets the previous client secret for key rotation.
    #[must_use]
    pub fn old_api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.old_api_secret_key = Some(key);
        self
    }

    /// Sets the requested scopes (required, non-empty).
    #[must_use]
    pub fn scopes(mut self, scopes: AuthScopes) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Sets the callback URL registered with the host (required).
    #[must_use]
    pub fn callback_url(mut self, url: HostUrl) -> Self {
        self.callback_url = Some(url);
        self
    }

    /// Sets the platform domain tenants must live under.
    #[must_use]
    pub fn platform_domain(mut self, domain: PlatformDomain) -> Self {
        self.platform_domain = Some(domain);
        self
    }

    /// Sets the pending handshake lifetime.
    #[must_use]
    pub const fn state_ttl(mut self, ttl: Duration) -> Self {
        self.state_ttl = Some(ttl);
        self
    }

    /// Sets the session lifetime.
    #[must_use]
    pub const fn session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = Some(ttl);
        self
    }

    /// Sets the credential exchange timeout.
    #[must_use]
    pub const fn exchange_timeout(mut self, timeout: Duration) -> Self {
        self.exchange_timeout = Some(timeout);
        self
    }

    /// Sets whether cookies are marked `Secure`. Only disable for local HTTP.
    #[must_use]
    pub const fn secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = Some(secure);
        self
    }

    /// Requests per-user (online) access tokens.
    #[must_use]
    pub const fn online_access(mut self, online: bool) -> Self {
        self.online_access = Some(online);
        self
    }

    /// Builds the [`HandshakeConfig`], validating required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if a required field is
    /// unset or a duration is zero, and [`ConfigError::InvalidScopes`] if the
    /// scope set is empty.
    pub fn build(self) -> Result<HandshakeConfig, ConfigError> {
        let api_key = self
            .api_key
            .ok_or(ConfigError::MissingRequiredField { field: "api_key" })?;
        let api_secret_key = self
            .api_secret_key
            .ok_or(ConfigError::MissingRequiredField {
                field: "api_secret_key",
            })?;
        let callback_url = self.callback_url.ok_or(ConfigError::MissingRequiredField {
            field: "callback_url",
        })?;
        let scopes = self
            .scopes
            .ok_or(ConfigError::MissingRequiredField { field: "scopes" })?;
        if scopes.is_empty() {
            return Err(ConfigError::InvalidScopes {
                reason: "at least one scope must be requested".to_string(),
            });
        }

        let state_ttl = non_zero(self.state_ttl.unwrap_or(DEFAULT_STATE_TTL), "state_ttl")?;
        let session_ttl = non_zero(
            self.session_ttl.unwrap_or(DEFAULT_SESSION_TTL),
            "session_ttl",
        )?;
        let exchange_timeout = non_zero(
            self.exchange_timeout.unwrap_or(DEFAULT_EXCHANGE_TIMEOUT),
            "exchange_timeout",
        )?;

        Ok(HandshakeConfig {
            api_key,
            api_secret_key,
            old_api_secret_key: self.old_api_secret_key,
            scopes,
            callback_url,
            platform_domain: self.platform_domain.unwrap_or_default(),
            state_ttl,
            session_ttl,
            exchange_timeout,
            secure_cookies: self.secure_cookies.unwrap_or(true),
            online_access: self.online_access.unwrap_or(false),
        })
    }
}

fn non_zero(duration: Duration, field: &'static str) -> Result<Duration, ConfigError> {
    if duration.is_zero() {
        return Err(ConfigError::MissingRequiredField { field });
    }
    Ok(duration)
}

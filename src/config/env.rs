//! Environment loading for [`HandshakeConfig`] and [`ServerConfig`].
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_API_KEY` - App client id
//! - `SHOPIFY_API_SECRET` - App client secret
//! - `SHOPIFY_CALLBACK_URL` - Absolute callback URL registered with the host
//! - `SHOPIFY_SCOPES` - Comma-separated requested scopes
//!
//! ## Optional
//! - `SHOPIFY_API_SECRET_OLD` - Previous client secret during rotation
//! - `SHOPIFY_PLATFORM_DOMAIN` - Tenant platform domain (default: myshopify.com)
//! - `HANDSHAKE_STATE_TTL_SECS` - Pending handshake lifetime (default: 600)
//! - `SESSION_TTL_SECS` - Session lifetime (default: 86400)
//! - `CREDENTIAL_EXCHANGE_TIMEOUT_SECS` - Exchange timeout (default: 10)
//! - `SECURE_COOKIES` - Mark cookies `Secure` (default: true)
//! - `SHOPIFY_ONLINE_ACCESS` - Request per-user tokens (default: false)
//! - `APP_HOST` - Bind address (default: 127.0.0.1)
//! - `APP_PORT` - Listen port (default: 3000)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use super::{
    ApiKey, ApiSecretKey, HandshakeConfig, HostUrl, PlatformDomain, DEFAULT_EXCHANGE_TIMEOUT,
    DEFAULT_SESSION_TTL, DEFAULT_STATE_TTL,
};
use crate::auth::AuthScopes;
use crate::error::ConfigError;

/// Bind address of the HTTP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
}

impl ServerConfig {
    /// Load the bind address from `APP_HOST` / `APP_PORT`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if either value does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);
        Ok(Self {
            host: env.parsed("APP_HOST", "127.0.0.1")?,
            port: env.parsed("APP_PORT", "3000")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl HandshakeConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or any value
    /// fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let scopes: AuthScopes = env.required("SHOPIFY_SCOPES")?.parse()?;
        let mut builder = Self::builder()
            .api_key(ApiKey::new(env.required("SHOPIFY_API_KEY")?)?)
            .api_secret_key(ApiSecretKey::new(env.required("SHOPIFY_API_SECRET")?)?)
            .callback_url(HostUrl::new(env.required("SHOPIFY_CALLBACK_URL")?)?)
            .scopes(scopes)
            .state_ttl(env.seconds("HANDSHAKE_STATE_TTL_SECS", DEFAULT_STATE_TTL)?)
            .session_ttl(env.seconds("SESSION_TTL_SECS", DEFAULT_SESSION_TTL)?)
            .exchange_timeout(env.seconds(
                "CREDENTIAL_EXCHANGE_TIMEOUT_SECS",
                DEFAULT_EXCHANGE_TIMEOUT,
            )?)
            .secure_cookies(env.flag("SECURE_COOKIES", true)?)
            .online_access(env.flag("SHOPIFY_ONLINE_ACCESS", false)?);

        if let Some(old) = env.optional("SHOPIFY_API_SECRET_OLD") {
            builder = builder.old_api_secret_key(ApiSecretKey::new(old)?);
        }
        if let Some(domain) = env.optional("SHOPIFY_PLATFORM_DOMAIN") {
            builder = builder.platform_domain(PlatformDomain::new(domain)?);
        }

        builder.build()
    }
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key)
            .as_deref()
            .unwrap_or(default)
            .trim()
            .parse::<T>()
            .map_err(|e| invalid(key, e))
    }

    fn seconds(&self, key: &str, default: Duration) -> Result<Duration, ConfigError> {
        match self.optional(key) {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) => Err(invalid(key, "must be greater than zero")),
                Ok(secs) => Ok(Duration::from_secs(secs)),
                Err(e) => Err(invalid(key, e)),
            },
        }
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = self.optional(key) else {
            return Ok(default);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(invalid(key, "expected true or false")),
        }
    }
}

fn invalid(key: &str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidEnvVar {
        name: key.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("SHOPIFY_API_KEY", "client-id"),
        ("SHOPIFY_API_SECRET", "client-secret"),
        ("SHOPIFY_CALLBACK_URL", "https://app.example.com/auth/callback"),
        ("SHOPIFY_SCOPES", "write_products"),
    ];

    #[test]
    fn test_from_lookup_with_required_only() {
        let config = HandshakeConfig::from_lookup(lookup(REQUIRED)).unwrap();

        assert_eq!(config.api_key().as_ref(), "client-id");
        assert_eq!(config.api_secret_key().expose(), "client-secret");
        assert_eq!(
            config.callback_url().as_ref(),
            "https://app.example.com/auth/callback"
        );
        assert_eq!(config.state_ttl(), DEFAULT_STATE_TTL);
        assert!(config.secure_cookies());
    }

    #[test]
    fn test_from_lookup_reports_missing_variable() {
        let vars: Vec<_> = REQUIRED
            .iter()
            .copied()
            .filter(|(k, _)| *k != "SHOPIFY_API_SECRET")
            .collect();
        let err = HandshakeConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert_eq!(err, ConfigError::MissingEnvVar("SHOPIFY_API_SECRET".to_string()));
    }

    #[test]
    fn test_from_lookup_reads_optional_values() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("SHOPIFY_API_SECRET_OLD", "previous-secret"),
            ("SHOPIFY_PLATFORM_DOMAIN", "example-platform.com"),
            ("HANDSHAKE_STATE_TTL_SECS", "120"),
            ("SESSION_TTL_SECS", "3600"),
            ("CREDENTIAL_EXCHANGE_TIMEOUT_SECS", "3"),
            ("SECURE_COOKIES", "false"),
            ("SHOPIFY_ONLINE_ACCESS", "1"),
        ]);
        let config = HandshakeConfig::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(
            config.old_api_secret_key().map(ApiSecretKey::expose),
            Some("previous-secret")
        );
        assert_eq!(config.platform_domain().as_ref(), "example-platform.com");
        assert_eq!(config.state_ttl(), Duration::from_secs(120));
        assert_eq!(config.session_ttl(), Duration::from_secs(3600));
        assert_eq!(config.exchange_timeout(), Duration::from_secs(3));
        assert!(!config.secure_cookies());
        assert!(config.online_access());
    }

    #[test]
    fn test_from_lookup_rejects_bad_numbers_and_flags() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("SESSION_TTL_SECS", "soon"));
        let err = HandshakeConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnvVar { ref name, .. } if name == "SESSION_TTL_SECS"
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("HANDSHAKE_STATE_TTL_SECS", "0"));
        assert!(HandshakeConfig::from_lookup(lookup(&vars)).is_err());

        let mut vars = REQUIRED.to_vec();
        vars.push(("SECURE_COOKIES", "maybe"));
        assert!(HandshakeConfig::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn test_server_config_defaults_and_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");

        let config =
            ServerConfig::from_lookup(lookup(&[("APP_HOST", "0.0.0.0"), ("APP_PORT", "8080")]))
                .unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");

        assert!(ServerConfig::from_lookup(lookup(&[("APP_PORT", "99999")])).is_err());
    }
}

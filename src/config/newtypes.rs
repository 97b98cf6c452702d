//! Validated newtype wrappers for configuration and tenant values.
//!
//! This module provides type-safe wrappers around string values that validate
//! their contents on construction. Invalid values are rejected with clear error messages.

use crate::error::ConfigError;
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, Serializer};
use std::fmt;

/// A validated app client id.
///
/// # Example
///
/// ```rust
/// use shop_handshake::ApiKey;
///
/// let key = ApiKey::new("my-api-key").unwrap();
/// assert_eq!(key.as_ref(), "my-api-key");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Creates a new validated API key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated app client secret.
///
/// The value lives in a [`SecretString`] and is masked in debug output, so a
/// stray `{:?}` in a log line never leaks it.
///
/// ```rust
/// use shop_handshake::ApiSecretKey;
///
/// let secret = ApiSecretKey::new("my-secret").unwrap();
/// assert_eq!(format!("{:?}", secret), "ApiSecretKey(*****)");
/// ```
#[derive(Clone)]
pub struct ApiSecretKey(SecretString);

impl ApiSecretKey {
    /// Creates a new validated API secret key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiSecretKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ConfigError::EmptyApiSecretKey);
        }
        Ok(Self(SecretString::from(key)))
    }

    /// Returns the raw secret for signing and the credential exchange.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for ApiSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiSecretKey(*****)")
    }
}

/// The host platform's domain under which every tenant lives.
///
/// Defaults to `myshopify.com`. Stored lowercase; each label must be
/// non-empty and consist of ASCII alphanumerics and hyphens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformDomain(String);

impl PlatformDomain {
    /// The platform domain used when none is configured.
    pub const DEFAULT: &'static str = "myshopify.com";

    /// Creates a validated platform domain.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPlatformDomain`] if any label is empty or
    /// contains characters outside `[a-z0-9-]`, or if there is no dot.
    pub fn new(domain: impl Into<String>) -> Result<Self, ConfigError> {
        let domain = domain.into().trim().to_ascii_lowercase();
        let valid = domain.contains('.')
            && domain.split('.').all(|label| {
                !label.is_empty()
                    && !label.starts_with('-')
                    && label
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            });

        if !valid {
            return Err(ConfigError::InvalidPlatformDomain { domain });
        }
        Ok(Self(domain))
    }
}

impl Default for PlatformDomain {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl AsRef<str> for PlatformDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A tenant identifier validated against the platform's domain grammar.
///
/// The accepted grammar is `^[a-zA-Z0-9][a-zA-Z0-9-]*\.<platform-domain>$`.
/// The value is kept byte-for-byte as supplied: the callback must carry the
/// exact same string that started the handshake, so no case folding or
/// short-name expansion happens here.
///
/// # Example
///
/// ```rust
/// use shop_handshake::{PlatformDomain, ShopDomain};
///
/// let platform = PlatformDomain::default();
/// let shop = ShopDomain::parse("my-store.myshopify.com", &platform).unwrap();
/// assert_eq!(shop.as_ref(), "my-store.myshopify.com");
/// assert_eq!(shop.shop_name(), "my-store");
///
/// assert!(ShopDomain::parse("my-store.evil.com", &platform).is_err());
/// assert!(ShopDomain::parse("-my-store.myshopify.com", &platform).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShopDomain {
    full_domain: String,
    shop_name_end: usize,
}

impl ShopDomain {
    /// Parses and validates a tenant identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidShopDomain`] if the value does not match
    /// the tenant grammar for `platform`.
    pub fn parse(domain: &str, platform: &PlatformDomain) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidShopDomain {
            domain: domain.to_string(),
            platform: platform.as_ref().to_string(),
        };

        let shop_name = domain
            .strip_suffix(platform.as_ref())
            .and_then(|rest| rest.strip_suffix('.'))
            .ok_or_else(invalid)?;

        if !Self::is_valid_shop_name(shop_name) {
            return Err(invalid());
        }

        Ok(Self {
            shop_name_end: shop_name.len(),
            full_domain: domain.to_string(),
        })
    }

    /// Returns the shop name portion of the domain.
    ///
    /// For `my-store.myshopify.com`, this returns `my-store`.
    #[must_use]
    pub fn shop_name(&self) -> &str {
        &self.full_domain[..self.shop_name_end]
    }

    fn is_valid_shop_name(name: &str) -> bool {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return false;
        };

        first.is_ascii_alphanumeric() && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.full_domain
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_domain)
    }
}

impl Serialize for ShopDomain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.full_domain)
    }
}

/// A validated absolute URL (used for the OAuth callback URL).
///
/// # Example
///
/// ```rust
/// use shop_handshake::HostUrl;
///
/// let url = HostUrl::new("https://myapp.example.com/auth/callback").unwrap();
/// assert_eq!(url.scheme(), "https");
/// assert_eq!(url.host_name(), Some("myapp.example.com"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostUrl {
    url: String,
    scheme_end: usize,
    host_start: usize,
    host_end: usize,
}

impl HostUrl {
    /// Creates a new validated URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHostUrl`] if the URL has no alphabetic
    /// scheme or no host.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into().trim().to_string();
        let invalid = || ConfigError::InvalidHostUrl { url: url.clone() };

        let scheme_end = url.find("://").ok_or_else(invalid)?;
        let scheme = &url[..scheme_end];
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }

        let host_start = scheme_end + 3;
        let remainder = &url[host_start..];
        let host_end = remainder
            .find([':', '/', '?', '#'])
            .map_or(url.len(), |i| host_start + i);

        if host_end == host_start {
            return Err(invalid());
        }

        Ok(Self {
            url,
            scheme_end,
            host_start,
            host_end,
        })
    }

    /// Returns the URL scheme (e.g., "https").
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.url[..self.scheme_end]
    }

    /// Returns the host name portion of the URL.
    #[must_use]
    pub fn host_name(&self) -> Option<&str> {
        let host = &self.url[self.host_start..self.host_end];
        if host.is_empty() {
            None
        } else {
            Some(host)
        }
    }
}

impl AsRef<str> for HostUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

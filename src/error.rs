//! Configuration error types.
//!
//! Every configuration constructor returns `Result<T, ConfigError>` so that a
//! misconfigured process fails at startup instead of at the first request.
//!
//! # Example
//!
//! ```rust
//! use shop_handshake::{ApiKey, ConfigError};
//!
//! let result = ApiKey::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyApiKey)));
//! ```

use thiserror::Error;

/// Errors that can occur while building or loading configuration.
///
/// Absence of a required setting is always fatal: the binary refuses to
/// start rather than serving requests with a partial configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// API key (client id) cannot be empty.
    #[error("API key cannot be empty. Please provide the app's client id.")]
    EmptyApiKey,

    /// API secret key cannot be empty.
    #[error("API secret key cannot be empty. Please provide the app's client secret.")]
    EmptyApiSecretKey,

    /// Shop domain does not match the tenant grammar.
    #[error("Invalid shop domain '{domain}'. Expected format: 'shop-name.{platform}'.")]
    InvalidShopDomain {
        /// The invalid domain that was provided.
        domain: String,
        /// The platform domain the shop was checked against.
        platform: String,
    },

    /// Platform domain is not a valid DNS name.
    #[error("Invalid platform domain '{domain}'. Expected a DNS name such as 'myshopify.com'.")]
    InvalidPlatformDomain {
        /// The invalid platform domain.
        domain: String,
    },

    /// Scopes are invalid.
    #[error("Invalid scopes: {reason}")]
    InvalidScopes {
        /// The reason the scopes are invalid.
        reason: String,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// Host URL is invalid.
    #[error("Invalid URL '{url}'. Please provide a valid URL with scheme (e.g., 'https://myapp.example.com/auth/callback').")]
    InvalidHostUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// A required environment variable is not set.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// An environment variable is set but cannot be parsed.
    #[error("Invalid environment variable {name}: {reason}")]
    InvalidEnvVar {
        /// Variable name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
}

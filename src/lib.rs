//! # Shop Handshake
//!
//! Authenticates a shop that installs or opens an app, following the host
//! platform's authorization-code handshake, and keeps a server-side session
//! for every authenticated shop.
//!
//! ## Overview
//!
//! - Type-safe configuration via [`HandshakeConfig`] and [`HandshakeConfigBuilder`]
//! - Validated newtypes for credentials, shop domains and URLs
//! - Scope handling with implied read scopes
//! - The handshake state machine, [`Handshake`]: start, complete, verify,
//!   logout and revoke
//! - Pluggable storage for pending handshakes and sessions via [`store`]
//! - Webhook signature verification via [`webhooks`]
//! - An axum router exposing the whole flow via [`server::router`]
//!
//! ## Quick Start
//!
//! ```rust
//! use shop_handshake::{ApiKey, ApiSecretKey, HandshakeConfig, HostUrl};
//!
//! let config = HandshakeConfig::builder()
//!     .api_key(ApiKey::new("your-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("your-api-secret").unwrap())
//!     .callback_url(HostUrl::new("https://app.example.com/auth/callback").unwrap())
//!     .scopes("read_products,write_orders".parse().unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert!(config.parse_shop("acme.myshopify.com").is_ok());
//! assert!(config.parse_shop("acme.example.com").is_err());
//! ```
//!
//! ## Serving the Handshake
//!
//! ```rust,no_run
//! use shop_handshake::{server, Handshake, HandshakeConfig, ServerConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let handshake = Handshake::in_memory(HandshakeConfig::from_env()?)?;
//! let listener = tokio::net::TcpListener::bind(ServerConfig::from_env()?.socket_addr()).await?;
//! axum::serve(listener, server::router(handshake)).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## The Callback Checks
//!
//! [`Handshake::complete`] runs a fixed sequence of checks; the first
//! failure ends the request:
//!
//! 1. `shop`, `code`, `state`, `hmac` present, non-empty, not repeated
//! 2. `shop` matches the platform domain grammar
//! 3. the pending cookie matches `state`, and a live pending handshake for
//!    the same shop is consumed
//! 4. the HMAC over the remaining parameters verifies
//! 5. the code is exchanged for a credential
//!
//! No external call is made before steps 1 to 4 pass.
//!
//! ## Thread Safety
//!
//! [`Handshake`] is `Clone`, `Send` and `Sync`; clones share the same
//! stores.

pub mod auth;
pub mod config;
pub mod error;
pub mod handshake;
pub mod server;
pub mod store;
pub mod webhooks;

// Re-export public types at crate root for convenience
pub use auth::{AuthScopes, Session, SessionId, SessionSummary};
pub use config::{
    ApiKey, ApiSecretKey, HandshakeConfig, HandshakeConfigBuilder, HostUrl, PlatformDomain,
    ServerConfig, ShopDomain,
};
pub use error::ConfigError;
pub use handshake::{Completed, Handshake, MemoryHandshake, Started};

// Re-export handshake types for convenience
pub use auth::oauth::{
    CallbackQuery, CredentialExchanger, ExchangeFailure, ExchangeFailureKind, HandshakeError,
    HttpCredentialExchanger,
};
pub use store::{MemoryPendingStore, MemorySessionStore, PendingHandshakeStore, SessionStore};

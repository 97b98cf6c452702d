//! Webhook signature verification.
//!
//! The host signs each webhook body with HMAC-SHA256 using the app's client
//! secret and sends the base64 digest in `X-Shopify-Hmac-Sha256`. The
//! signature is checked before the shop header is trusted.
//!
//! # Example
//!
//! ```rust
//! use shop_handshake::auth::oauth::hmac::compute_signature_base64;
//! use shop_handshake::webhooks::{verify_webhook, WebhookRequest};
//! use shop_handshake::{ApiKey, ApiSecretKey, HandshakeConfig, HostUrl};
//!
//! let config = HandshakeConfig::builder()
//!     .api_key(ApiKey::new("key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("secret").unwrap())
//!     .callback_url(HostUrl::new("https://app.example.com/auth/callback").unwrap())
//!     .scopes("read_products".parse().unwrap())
//!     .build()
//!     .unwrap();
//!
//! let body = br#"{"id":1}"#;
//! let request = WebhookRequest::new(
//!     body.to_vec(),
//!     compute_signature_base64(body, "secret"),
//!     Some("app/uninstalled".to_string()),
//!     Some("acme.myshopify.com".to_string()),
//! );
//!
//! let verified = verify_webhook(&config, &request).unwrap();
//! assert_eq!(verified.shop.as_ref(), "acme.myshopify.com");
//! ```

use crate::auth::oauth::hmac::validate_webhook_hmac;
use crate::config::{HandshakeConfig, ShopDomain};
use crate::webhooks::WebhookError;

/// HTTP header carrying the base64 HMAC-SHA256 of the body.
pub const HEADER_HMAC: &str = "X-Shopify-Hmac-Sha256";

/// HTTP header carrying the webhook topic.
pub const HEADER_TOPIC: &str = "X-Shopify-Topic";

/// HTTP header carrying the originating shop's domain.
pub const HEADER_SHOP_DOMAIN: &str = "X-Shopify-Shop-Domain";

/// Topic sent when the app is removed from a shop.
pub const TOPIC_APP_UNINSTALLED: &str = "app/uninstalled";

/// An incoming webhook as received, before verification.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    body: Vec<u8>,
    hmac_header: String,
    topic: Option<String>,
    shop_domain: Option<String>,
}

impl WebhookRequest {
    /// Wraps the raw body and the relevant headers.
    #[must_use]
    pub const fn new(
        body: Vec<u8>,
        hmac_header: String,
        topic: Option<String>,
        shop_domain: Option<String>,
    ) -> Self {
        Self {
            body,
            hmac_header,
            topic,
            shop_domain,
        }
    }

    /// Raw body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Signature header value.
    #[must_use]
    pub fn hmac_header(&self) -> &str {
        &self.hmac_header
    }
}

/// A webhook whose signature and shop header have been checked.
#[derive(Debug, Clone)]
pub struct VerifiedWebhook {
    /// The shop the webhook is about.
    pub shop: ShopDomain,
    /// Topic header, if sent.
    pub topic: Option<String>,
}

impl VerifiedWebhook {
    /// Keeps the webhook only if its topic is `expected`.
    ///
    /// # Errors
    ///
    /// [`WebhookError::UnexpectedTopic`] if the topic header is absent or differs.
    pub fn require_topic(self, expected: &str) -> Result<Self, WebhookError> {
        if self.topic.as_deref() == Some(expected) {
            Ok(self)
        } else {
            Err(WebhookError::UnexpectedTopic)
        }
    }
}

/// Verifies a webhook's signature, then its shop header.
///
/// # Errors
///
/// - [`WebhookError::InvalidHmac`] if neither the current nor the previous
///   secret produces the received signature
/// - [`WebhookError::InvalidShopDomain`] if the shop header is absent or
///   fails the tenant grammar
pub fn verify_webhook(
    config: &HandshakeConfig,
    request: &WebhookRequest,
) -> Result<VerifiedWebhook, WebhookError> {
    if !validate_webhook_hmac(request.body(), request.hmac_header(), config) {
        return Err(WebhookError::InvalidHmac);
    }

    let shop = request
        .shop_domain
        .as_deref()
        .and_then(|domain| config.parse_shop(domain).ok())
        .ok_or(WebhookError::InvalidShopDomain)?;

    Ok(VerifiedWebhook {
        shop,
        topic: request.topic.clone(),
    })
}

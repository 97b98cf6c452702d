//! Webhook error types.

use thiserror::Error;

/// Errors that reject an incoming webhook.
///
/// # Example
///
/// ```rust
/// use shop_handshake::webhooks::WebhookError;
///
/// let error = WebhookError::InvalidHmac;
/// assert_eq!(error.to_string(), "Webhook signature verification failed");
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WebhookError {
    /// The body does not match the `X-Shopify-Hmac-Sha256` signature.
    #[error("Webhook signature verification failed")]
    InvalidHmac,

    /// The shop header is missing or does not match the tenant grammar.
    #[error("Webhook shop domain is missing or invalid")]
    InvalidShopDomain,

    /// The topic header is missing or names a topic this endpoint does not handle.
    #[error("Webhook topic is missing or not handled by this endpoint")]
    UnexpectedTopic,
}

//! Host webhooks.
//!
//! Only signature verification lives here; the app reacts to a single topic,
//! `app/uninstalled`, by revoking the shop's sessions through
//! [`Handshake::revoke_shop`](crate::Handshake::revoke_shop).

mod errors;
mod verification;

pub use errors::WebhookError;
pub use verification::{
    verify_webhook, VerifiedWebhook, WebhookRequest, HEADER_HMAC, HEADER_SHOP_DOMAIN, HEADER_TOPIC,
    TOPIC_APP_UNINSTALLED,
};

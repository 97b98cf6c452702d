//! HMAC-SHA256 signatures for host callbacks and webhooks.
//!
//! Callback parameters are signed as lowercase hex; webhook bodies are signed
//! as standard base64 in the `X-Shopify-Hmac-Sha256` header. Every
//! comparison is constant-time, and both checks accept the previous client
//! secret while a rotation is in progress.
//!
//! # Example
//!
//! ```rust
//! use shop_handshake::auth::oauth::hmac::{compute_signature, compute_signature_base64};
//!
//! let signature = compute_signature("code=abc&shop=acme.myshopify.com", "secret");
//! assert_eq!(signature.len(), 64);
//!
//! let webhook = compute_signature_base64(b"{}", "secret");
//! assert_eq!(webhook.len(), 44);
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::CallbackQuery;
use crate::config::{ApiSecretKey, HandshakeConfig};

type HmacSha256 = Hmac<Sha256>;

fn mac(message: &[u8], secret: &str) -> [u8; 32] {
    #[allow(clippy::expect_used)] // HMAC accepts keys of any length
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// Computes a lowercase hex HMAC-SHA256 of `message`.
#[must_use]
pub fn compute_signature(message: &str, secret: &str) -> String {
    hex::encode(mac(message.as_bytes(), secret))
}

/// Computes a standard base64 HMAC-SHA256 of raw bytes.
#[must_use]
pub fn compute_signature_base64(message: &[u8], secret: &str) -> String {
    STANDARD.encode(mac(message, secret))
}

/// Compares two strings in constant time.
///
/// Length differences are not hidden, which is fine for fixed-length
/// signatures and nonces.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn secrets(config: &HandshakeConfig) -> impl Iterator<Item = &ApiSecretKey> {
    std::iter::once(config.api_secret_key()).chain(config.old_api_secret_key())
}

/// Verifies the `hmac` of a callback against its other parameters.
///
/// Tries the current secret, then the previous one if configured.
#[must_use]
pub fn validate_hmac(query: &CallbackQuery, received: &str, config: &HandshakeConfig) -> bool {
    let signable = query.to_signable_string();
    let received = received.to_ascii_lowercase();

    secrets(config).any(|secret| {
        constant_time_compare(&compute_signature(&signable, secret.expose()), &received)
    })
}

/// Verifies a webhook body against its base64 signature header.
#[must_use]
pub fn validate_webhook_hmac(body: &[u8], received: &str, config: &HandshakeConfig) -> bool {
    let received = received.trim();

    secrets(config).any(|secret| {
        constant_time_compare(&compute_signature_base64(body, secret.expose()), received)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, HostUrl};

    fn config(old: Option<&str>) -> HandshakeConfig {
        let mut builder = HandshakeConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("current-secret").unwrap())
            .callback_url(HostUrl::new("https://app.example.com/auth/callback").unwrap())
            .scopes("read_products".parse().unwrap());
        if let Some(old) = old {
            builder = builder.old_api_secret_key(ApiSecretKey::new(old).unwrap());
        }
        builder.build().unwrap()
    }

    fn callback() -> CallbackQuery {
        CallbackQuery::from_pairs(vec![
            ("code".to_string(), "abc".to_string()),
            ("shop".to_string(), "acme.myshopify.com".to_string()),
            ("state".to_string(), "xyz".to_string()),
            ("timestamp".to_string(), "1700000000".to_string()),
        ])
    }

    #[test]
    fn test_compute_signature_known_vector() {
        // RFC 4231 test case 2
        assert_eq!(
            compute_signature("what do ya want for nothing?", "Jefe"),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_compute_signature_base64_known_vector() {
        assert_eq!(
            compute_signature_base64(b"what do ya want for nothing?", "Jefe"),
            "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM="
        );
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
        assert!(constant_time_compare("", ""));
    }

    #[test]
    fn test_validate_hmac_with_current_secret() {
        let query = callback();
        let hmac = compute_signature(&query.to_signable_string(), "current-secret");
        assert!(validate_hmac(&query, &hmac, &config(None)));
        assert!(validate_hmac(&query, &hmac.to_uppercase(), &config(None)));
    }

    #[test]
    fn test_validate_hmac_falls_back_to_old_secret() {
        let query = callback();
        let hmac = compute_signature(&query.to_signable_string(), "old-secret");
        assert!(!validate_hmac(&query, &hmac, &config(None)));
        assert!(validate_hmac(&query, &hmac, &config(Some("old-secret"))));
    }

    #[test]
    fn test_validate_hmac_detects_tampering() {
        let query = callback();
        let hmac = compute_signature(&query.to_signable_string(), "current-secret");

        let tampered = CallbackQuery::from_pairs(vec![
            ("code".to_string(), "abc".to_string()),
            ("shop".to_string(), "evil.myshopify.com".to_string()),
            ("state".to_string(), "xyz".to_string()),
            ("timestamp".to_string(), "1700000000".to_string()),
        ]);
        assert!(!validate_hmac(&tampered, &hmac, &config(None)));
    }

    #[test]
    fn test_validate_webhook_hmac() {
        let body = br#"{"id":1}"#;
        let good = compute_signature_base64(body, "current-secret");
        let old = compute_signature_base64(body, "old-secret");

        assert!(validate_webhook_hmac(body, &good, &config(None)));
        assert!(!validate_webhook_hmac(body, &old, &config(None)));
        assert!(validate_webhook_hmac(body, &old, &config(Some("old-secret"))));
        assert!(!validate_webhook_hmac(b"{\"id\":2}", &good, &config(None)));
    }
}

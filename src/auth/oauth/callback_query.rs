//! The raw parameter set of a host callback.
//!
//! The host signs every parameter it sends, not just the four the handshake
//! needs, so [`CallbackQuery`] keeps the complete list in arrival order and
//! only picks out `shop`, `code`, `state` and `hmac` on demand.

use super::error::HandshakeError;

const SIGNATURE_KEYS: [&str; 2] = ["hmac", "signature"];

/// Query parameters received on the callback URL.
///
/// # Example
///
/// ```rust
/// use shop_handshake::auth::oauth::CallbackQuery;
///
/// let query = CallbackQuery::from_pairs(vec![
///     ("state".to_string(), "s1".to_string()),
///     ("shop".to_string(), "acme.myshopify.com".to_string()),
///     ("hmac".to_string(), "abc".to_string()),
///     ("code".to_string(), "c0de".to_string()),
/// ]);
///
/// assert_eq!(
///     query.to_signable_string(),
///     "code=c0de&shop=acme.myshopify.com&state=s1"
/// );
/// ```
#[derive(Clone, Debug, Default)]
pub struct CallbackQuery {
    pairs: Vec<(String, String)>,
}

/// The four parameters every callback must carry, borrowed from a
/// [`CallbackQuery`].
#[derive(Clone, Copy, Debug)]
pub struct RequiredParams<'a> {
    /// Claimed tenant.
    pub shop: &'a str,
    /// Authorization code to exchange.
    pub code: &'a str,
    /// Nonce issued at start.
    pub state: &'a str,
    /// Hex signature over the other parameters.
    pub hmac: &'a str,
}

impl CallbackQuery {
    /// Builds a query from decoded key/value pairs.
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Returns the single value of `key`.
    ///
    /// `None` if the key is absent, empty, or appears more than once.
    #[must_use]
    pub fn single(&self, key: &str) -> Option<&str> {
        let mut values = self
            .pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str());

        match (values.next(), values.next()) {
            (Some(value), None) if !value.is_empty() => Some(value),
            _ => None,
        }
    }

    /// Picks out the parameters the handshake cannot proceed without.
    ///
    /// # Errors
    ///
    /// Returns [`HandshakeError::MissingParameters`] if any of `shop`,
    /// `code`, `state` or `hmac` is absent, empty, or repeated.
    pub fn required(&self) -> Result<RequiredParams<'_>, HandshakeError> {
        let get = |key| self.single(key).ok_or(HandshakeError::MissingParameters);
        Ok(RequiredParams {
            shop: get("shop")?,
            code: get("code")?,
            state: get("state")?,
            hmac: get("hmac")?,
        })
    }

    /// Builds the message the host signed.
    ///
    /// All parameters except `hmac` and `signature`, sorted by key (ties by
    /// value), rendered as `key=value` and joined with `&`. In values `%`
    /// and `&` are percent-escaped; keys additionally escape `=`.
    #[must_use]
    pub fn to_signable_string(&self) -> String {
        let mut pairs: Vec<(String, String)> = self
            .pairs
            .iter()
            .filter(|(k, _)| !SIGNATURE_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (escape_key(k), escape_value(v)))
            .collect();
        pairs.sort();

        pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn escape_value(value: &str) -> String {
    value.replace('%', "%25").replace('&', "%26")
}

fn escape_key(key: &str) -> String {
    escape_value(key).replace('=', "%3D")
}

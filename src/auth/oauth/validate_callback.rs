//! Callback validation and credential exchange.
//!
//! [`validate_auth_callback`] runs the callback checks in a fixed order.
//! Every check before the exchange is local, so forged, replayed or stale
//! callbacks are turned away without any call to the host:
//!
//! 1. `shop`, `code`, `state`, `hmac` present exactly once and non-empty
//! 2. `shop` matches the tenant grammar
//! 3. the pending cookie equals `state`, and the pending record for `state`
//!    exists, belongs to `shop` and is still live (the record is consumed
//!    whatever the outcome)
//! 4. the HMAC over the remaining parameters verifies
//! 5. the code is exchanged for a credential
//!
//! The caller persists the returned [`Session`].

use chrono::{DateTime, Utc};

use crate::auth::oauth::error::HandshakeError;
use crate::auth::oauth::hmac::{constant_time_compare, validate_hmac};
use crate::auth::oauth::token_exchange::CredentialExchanger;
use crate::auth::oauth::CallbackQuery;
use crate::auth::Session;
use crate::config::HandshakeConfig;
use crate::store::PendingHandshakeStore;

/// Validates a callback and exchanges its code for a [`Session`].
///
/// `cookie_state` is the value of the pending-handshake cookie, if the
/// browser sent one.
///
/// # Errors
///
/// - [`HandshakeError::MissingParameters`]: a required parameter is absent,
///   empty or repeated
/// - [`HandshakeError::InvalidTenant`]: `shop` fails the tenant grammar
/// - [`HandshakeError::InvalidOrExpiredState`]: cookie mismatch, unknown or
///   already consumed state, shop mismatch, or expired record
/// - [`HandshakeError::SignatureInvalid`]: HMAC does not verify
/// - [`HandshakeError::CredentialExchangeFailed`]: the host rejected the
///   code or could not be reached
/// - [`HandshakeError::Store`]: the pending store failed
pub async fn validate_auth_callback<P, E>(
    config: &HandshakeConfig,
    pending_store: &P,
    exchanger: &E,
    query: &CallbackQuery,
    cookie_state: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Session, HandshakeError>
where
    P: PendingHandshakeStore,
    E: CredentialExchanger,
{
    let params = query.required()?;

    let shop = config
        .parse_shop(params.shop)
        .map_err(|_| HandshakeError::InvalidTenant)?;

    let cookie_matches = cookie_state.is_some_and(|c| constant_time_compare(c, params.state));
    if !cookie_matches {
        return Err(HandshakeError::InvalidOrExpiredState);
    }

    let pending = pending_store
        .take(params.state)
        .await?
        .ok_or(HandshakeError::InvalidOrExpiredState)?;
    if pending.shop != shop || pending.is_expired_at(now, config.state_ttl()) {
        return Err(HandshakeError::InvalidOrExpiredState);
    }

    if !validate_hmac(query, params.hmac, config) {
        return Err(HandshakeError::SignatureInvalid);
    }

    let token = exchanger.exchange(&shop, params.code).await.map_err(|e| {
        let kind = e.kind();
        tracing::error!(
            shop = %shop,
            kind = kind.as_str(),
            error = %e,
            "credential exchange failed"
        );
        HandshakeError::CredentialExchangeFailed(kind)
    })?;

    // The merchant may decline some scopes; the session records what was granted.
    if !token.scope.covers(config.scopes()) {
        tracing::warn!(
            shop = %shop,
            requested = %config.scopes(),
            granted = %token.scope,
            "granted scopes do not cover requested scopes"
        );
    }

    Ok(Session::from_access_token_response(
        shop,
        token,
        now,
        config.session_ttl(),
    ))
}

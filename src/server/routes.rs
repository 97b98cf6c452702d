//! Route handlers. Each one adapts a single [`Handshake`] method to HTTP.

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use super::cookies;
use super::guard::found;
use crate::auth::oauth::{CallbackQuery, CredentialExchanger, HandshakeError};
use crate::auth::SessionSummary;
use crate::handshake::Handshake;
use crate::store::{PendingHandshakeStore, SessionStore};
use crate::webhooks::{
    verify_webhook, WebhookRequest, HEADER_HMAC, HEADER_SHOP_DOMAIN, HEADER_TOPIC,
    TOPIC_APP_UNINSTALLED,
};

// ── Start ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(crate) struct StartParams {
    shop: Option<String>,
}

pub(crate) async fn start<P, S, E>(
    State(handshake): State<Handshake<P, S, E>>,
    jar: CookieJar,
    params: Result<Query<StartParams>, QueryRejection>,
) -> Result<(CookieJar, Response), HandshakeError>
where
    P: PendingHandshakeStore,
    S: SessionStore,
    E: CredentialExchanger,
{
    let shop = params
        .ok()
        .and_then(|Query(params)| params.shop)
        .unwrap_or_default();

    let started = handshake.start(&shop).await?;
    let cookie = cookies::pending_cookie(&started.state, handshake.config());

    Ok((jar.add(cookie), found(started.redirect_url)))
}

// ── Callback ───────────────────────────────────────────────────────

pub(crate) async fn callback<P, S, E>(
    State(handshake): State<Handshake<P, S, E>>,
    jar: CookieJar,
    params: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<(CookieJar, Response), HandshakeError>
where
    P: PendingHandshakeStore,
    S: SessionStore,
    E: CredentialExchanger,
{
    let Query(pairs) = params.map_err(|_| HandshakeError::MissingParameters)?;
    let query = CallbackQuery::from_pairs(pairs);
    let cookie_state = cookies::pending_state(&jar);
    let previous = cookies::session_id(&jar);

    let completed = handshake
        .complete(&query, cookie_state.as_deref(), previous.as_ref())
        .await?;

    let session_cookie = cookies::session_cookie(
        &completed.session,
        handshake.config().secure_cookies(),
        Utc::now(),
    );
    let jar = jar
        .add(session_cookie)
        .add(cookies::clear_pending_cookie());

    Ok((jar, found(completed.redirect_to)))
}

// ── Logout ─────────────────────────────────────────────────────────

pub(crate) async fn logout<P, S, E>(
    State(handshake): State<Handshake<P, S, E>>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), HandshakeError>
where
    P: PendingHandshakeStore,
    S: SessionStore,
    E: CredentialExchanger,
{
    if let Some(id) = cookies::session_id(&jar) {
        handshake.logout(&id).await?;
    }

    Ok((jar.add(cookies::clear_session_cookie()), StatusCode::NO_CONTENT))
}

// ── Webhooks ───────────────────────────────────────────────────────

pub(crate) async fn app_uninstalled<P, S, E>(
    State(handshake): State<Handshake<P, S, E>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    P: PendingHandshakeStore,
    S: SessionStore,
    E: CredentialExchanger,
{
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };

    let request = WebhookRequest::new(
        body.to_vec(),
        header(HEADER_HMAC).unwrap_or_default(),
        header(HEADER_TOPIC),
        header(HEADER_SHOP_DOMAIN),
    );

    let verified = match verify_webhook(handshake.config(), &request)
        .and_then(|verified| verified.require_topic(TOPIC_APP_UNINSTALLED))
    {
        Ok(verified) => verified,
        Err(e) => {
            tracing::warn!(error = %e, "webhook rejected");
            return e.into_response();
        }
    };

    match handshake.revoke_shop(&verified.shop).await {
        Ok(_) => StatusCode::OK.into_response(),
        Err(e) => e.into_response(),
    }
}

// ── Protected ──────────────────────────────────────────────────────

pub(crate) async fn session_summary(
    Extension(summary): Extension<SessionSummary>,
) -> Json<SessionSummary> {
    Json(summary)
}

pub(crate) async fn entry_point(Extension(summary): Extension<SessionSummary>) -> Json<Value> {
    Json(json!({ "shop": summary.shop }))
}

pub(crate) async fn health() -> &'static str {
    "ok"
}

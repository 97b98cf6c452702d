//! Session gate for protected route groups.
//!
//! Each protected group is layered with [`require_session`] and a
//! [`RequestKind`] chosen when the router is built. The kind decides what an
//! unauthenticated request gets back:
//!
//! - [`RequestKind::Api`]: a JSON 401
//! - [`RequestKind::Navigation`]: a 302 to `/auth/start`, or a top-level
//!   breakout page when the app is rendered inside the host's frame
//!   (`embedded=1`)
//!
//! On success the [`SessionSummary`] is inserted into the request
//! extensions. Handlers never see the credential.

use axum::extract::{Query, Request, State};
use axum::http::{header, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::cookies;
use crate::auth::oauth::CredentialExchanger;
use crate::auth::SessionSummary;
use crate::config::HandshakeConfig;
use crate::handshake::Handshake;
use crate::store::{PendingHandshakeStore, SessionStore};

/// How an unauthenticated request to a route group is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Programmatic calls; answered with JSON 401.
    Api,
    /// Browser page loads; sent back through the handshake.
    Navigation,
}

/// Middleware state: the handshake plus the group's request kind.
pub(crate) struct Gate<P, S, E> {
    handshake: Handshake<P, S, E>,
    kind: RequestKind,
}

impl<P, S, E> Gate<P, S, E> {
    pub(crate) const fn new(handshake: Handshake<P, S, E>, kind: RequestKind) -> Self {
        Self { handshake, kind }
    }
}

impl<P, S, E> Clone for Gate<P, S, E> {
    fn clone(&self) -> Self {
        Self {
            handshake: self.handshake.clone(),
            kind: self.kind,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GateParams {
    shop: Option<String>,
    embedded: Option<String>,
}

pub(crate) async fn require_session<P, S, E>(
    State(gate): State<Gate<P, S, E>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response
where
    P: PendingHandshakeStore,
    S: SessionStore,
    E: CredentialExchanger,
{
    let id = cookies::session_id(&jar);

    match gate.handshake.verify(id.as_ref()).await {
        Ok(session) => {
            request.extensions_mut().insert::<SessionSummary>(session.summary());
            next.run(request).await
        }
        Err(e) if e.is_unauthenticated() => {
            tracing::debug!(
                error = e.wire_name(),
                path = %request.uri().path(),
                "unauthenticated request"
            );
            let response = match gate.kind {
                RequestKind::Api => e.into_response(),
                RequestKind::Navigation => reauthenticate(gate.handshake.config(), request.uri()),
            };
            if id.is_some() {
                (jar.add(cookies::clear_session_cookie()), response).into_response()
            } else {
                response
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "session lookup failed");
            e.into_response()
        }
    }
}

/// Sends a browser navigation back to the start of the handshake.
fn reauthenticate(config: &HandshakeConfig, uri: &Uri) -> Response {
    let params = Query::<GateParams>::try_from_uri(uri)
        .map(|Query(params)| params)
        .unwrap_or_default();
    let location = start_location(config, params.shop.as_deref());

    if params.embedded.as_deref() == Some("1") {
        frame_breakout(&location)
    } else {
        found(location)
    }
}

/// `/auth/start`, carrying the shop only if it passes the tenant grammar.
fn start_location(config: &HandshakeConfig, shop: Option<&str>) -> String {
    match shop.and_then(|shop| config.parse_shop(shop).ok()) {
        Some(shop) => format!("/auth/start?shop={}", urlencoding::encode(shop.as_ref())),
        None => "/auth/start".to_string(),
    }
}

/// A plain 302. `Redirect::to` answers 303, which is not what the host expects.
pub(crate) fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

// `location` is built from a validated shop domain and URL-encoded, so it
// holds no quote or angle bracket.
fn frame_breakout(location: &str) -> Response {
    Html(breakout_document(location)).into_response()
}

fn breakout_document(location: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Redirecting</title>
<script>window.top.location.href = "{location}";</script>
</head>
<body>
<noscript><a href="{location}" target="_top">Continue to login</a></noscript>
</body>
</html>
"#
    )
}

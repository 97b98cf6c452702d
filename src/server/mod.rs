//! HTTP surface.
//!
//! [`router`] wires the handshake into an axum [`Router`]:
//!
//! | Route | Gate | Success |
//! |-------|------|---------|
//! | `GET /auth/start?shop=` | none | 302 to the host, pending cookie set |
//! | `GET /auth/callback` | none | 302 to `/?shop=`, session cookie set |
//! | `POST /auth/logout` | none | 204, session cookie cleared |
//! | `POST /webhooks/app/uninstalled` | signature | 200, shop sessions revoked |
//! | `GET /api/session` | [`RequestKind::Api`] | session summary JSON |
//! | `GET /` | [`RequestKind::Navigation`] | `{"shop": ...}` |
//! | `GET /health` | none | `ok` |
//!
//! Failures are JSON `{"error", "message"}` bodies.

mod cookies;
mod error;
mod guard;
mod routes;

use axum::extract::Request;
use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::auth::oauth::CredentialExchanger;
use crate::handshake::Handshake;
use crate::store::{PendingHandshakeStore, SessionStore};

pub use cookies::{PENDING_COOKIE, SESSION_COOKIE};
pub use guard::RequestKind;

/// Builds the application router around a shared [`Handshake`].
pub fn router<P, S, E>(handshake: Handshake<P, S, E>) -> Router
where
    P: PendingHandshakeStore,
    S: SessionStore,
    E: CredentialExchanger,
{
    let api = Router::new()
        .route("/api/session", get(routes::session_summary))
        .route_layer(middleware::from_fn_with_state(
            guard::Gate::new(handshake.clone(), RequestKind::Api),
            guard::require_session::<P, S, E>,
        ));

    let app = Router::new()
        .route("/", get(routes::entry_point))
        .route_layer(middleware::from_fn_with_state(
            guard::Gate::new(handshake.clone(), RequestKind::Navigation),
            guard::require_session::<P, S, E>,
        ));

    Router::new()
        .route("/auth/start", get(routes::start::<P, S, E>))
        .route("/auth/callback", get(routes::callback::<P, S, E>))
        .route("/auth/logout", post(routes::logout::<P, S, E>))
        .route(
            "/webhooks/app/uninstalled",
            post(routes::app_uninstalled::<P, S, E>),
        )
        .route("/health", get(routes::health))
        .with_state(handshake)
        .merge(api)
        .merge(app)
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
}

/// Span for one request. Only the path is recorded: callback query strings
/// carry the authorization code.
fn request_span(request: &Request) -> Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
    )
}

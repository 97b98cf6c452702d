//! Cookies set by the handshake routes.

use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use time::Duration;

use crate::auth::oauth::StateParam;
use crate::auth::session::{Session, SessionId};
use crate::config::HandshakeConfig;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "shop_session";

/// Name of the cookie mirroring the pending handshake's state.
pub const PENDING_COOKIE: &str = "shop_handshake_state";

const PENDING_PATH: &str = "/auth";
const SESSION_PATH: &str = "/";

/// Pending-handshake cookie, scoped to `/auth` and living as long as the
/// pending record.
pub(crate) fn pending_cookie(state: &StateParam, config: &HandshakeConfig) -> Cookie<'static> {
    Cookie::build((PENDING_COOKIE, state.as_ref().to_string()))
        .http_only(true)
        .secure(config.secure_cookies())
        .same_site(SameSite::Lax)
        .path(PENDING_PATH)
        .max_age(max_age(config.state_ttl()))
        .build()
}

pub(crate) fn clear_pending_cookie() -> Cookie<'static> {
    Cookie::build((PENDING_COOKIE, ""))
        .path(PENDING_PATH)
        .max_age(Duration::ZERO)
        .build()
}

/// Session cookie; max-age is whatever the session has left at `now`.
pub(crate) fn session_cookie(
    session: &Session,
    secure: bool,
    now: DateTime<Utc>,
) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session.id.as_str().to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path(SESSION_PATH)
        .max_age(max_age(session.remaining_at(now)))
        .build()
}

pub(crate) fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path(SESSION_PATH)
        .max_age(Duration::ZERO)
        .build()
}

pub(crate) fn session_id(jar: &CookieJar) -> Option<SessionId> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| SessionId::from_cookie(cookie.value()))
}

pub(crate) fn pending_state(jar: &CookieJar) -> Option<String> {
    jar.get(PENDING_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

fn max_age(lifetime: std::time::Duration) -> Duration {
    Duration::seconds(i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::AccessTokenResponse;
    use crate::config::{ApiKey, ApiSecretKey, HostUrl};

    fn config(secure: bool) -> HandshakeConfig {
        HandshakeConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .callback_url(HostUrl::new("https://app.example.com/auth/callback").unwrap())
            .scopes("read_products".parse().unwrap())
            .secure_cookies(secure)
            .build()
            .unwrap()
    }

    #[test]
    fn test_pending_cookie_attributes() {
        let state = StateParam::from_raw("abc");
        let cookie = pending_cookie(&state, &config(true));

        assert_eq!(cookie.name(), "shop_handshake_state");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/auth"));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(600)));
    }

    fn session(issued_at: DateTime<Utc>) -> Session {
        Session::from_access_token_response(
            config(true).parse_shop("acme.myshopify.com").unwrap(),
            AccessTokenResponse {
                access_token: "shpat_x".to_string(),
                scope: "read_products".parse().unwrap(),
                expires_in: None,
            },
            issued_at,
            std::time::Duration::from_secs(3600),
        )
    }

    #[test]
    fn test_insecure_cookies_when_disabled() {
        let config = config(false);
        let pending = pending_cookie(&StateParam::from_raw("abc"), &config);
        assert_eq!(pending.secure(), Some(false));

        let now = Utc::now();
        let session = session_cookie(&session(now), config.secure_cookies(), now);
        assert_eq!(session.secure(), Some(false));
        assert_eq!(session.same_site(), Some(SameSite::Lax));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let issued_at = Utc::now();
        let session = session(issued_at);

        let later = issued_at + chrono::Duration::seconds(600);
        let cookie = session_cookie(&session, true, later);

        assert_eq!(cookie.name(), "shop_session");
        assert_eq!(cookie.value(), session.id.as_str());
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(3000)));
    }

    #[test]
    fn test_clear_cookies_expire_immediately() {
        assert_eq!(clear_session_cookie().max_age(), Some(Duration::ZERO));
        assert_eq!(clear_pending_cookie().path(), Some("/auth"));
    }

    #[test]
    fn test_jar_readers_ignore_empty_values() {
        let jar = CookieJar::new()
            .add(Cookie::new(SESSION_COOKIE, ""))
            .add(Cookie::new(PENDING_COOKIE, ""));
        assert!(session_id(&jar).is_none());
        assert!(pending_state(&jar).is_none());
    }
}

//! The handshake service.
//!
//! [`Handshake`] owns the configuration, both stores and the credential
//! exchanger. It is built once at startup and cloned cheaply into every
//! request; HTTP handlers are thin adapters over its methods.
//!
//! # Example
//!
//! ```rust,no_run
//! use shop_handshake::{Handshake, HandshakeConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HandshakeConfig::from_env()?;
//! let handshake = Handshake::in_memory(config)?;
//!
//! let started = handshake.start("acme.myshopify.com").await?;
//! println!("redirect to {}", started.redirect_url);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use chrono::Utc;

use crate::auth::oauth::{
    begin_auth, validate_auth_callback, CallbackQuery, CredentialExchanger, HandshakeError,
    HttpCredentialExchanger, StateParam,
};
use crate::auth::session::{Session, SessionId};
use crate::config::{HandshakeConfig, ShopDomain};
use crate::store::{MemoryPendingStore, MemorySessionStore, PendingHandshakeStore, SessionStore};

/// Outcome of [`Handshake::start`].
#[derive(Clone, Debug)]
pub struct Started {
    /// Host authorization URL to redirect the browser to.
    pub redirect_url: String,
    /// Nonce to mirror in the pending-handshake cookie.
    pub state: StateParam,
}

/// Outcome of [`Handshake::complete`].
#[derive(Clone, Debug)]
pub struct Completed {
    /// The newly issued session.
    pub session: Session,
    /// Application entry point carrying the tenant.
    pub redirect_to: String,
}

/// The shop authentication state machine.
pub struct Handshake<P, S, E> {
    inner: Arc<Inner<P, S, E>>,
}

struct Inner<P, S, E> {
    config: HandshakeConfig,
    pending: P,
    sessions: S,
    exchanger: E,
}

impl<P, S, E> Clone for Handshake<P, S, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// The handshake wired with in-memory stores and the HTTP exchanger.
pub type MemoryHandshake =
    Handshake<MemoryPendingStore, MemorySessionStore, HttpCredentialExchanger>;

impl MemoryHandshake {
    /// Builds a handshake with in-memory stores.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn in_memory(config: HandshakeConfig) -> Result<Self, reqwest::Error> {
        let exchanger = HttpCredentialExchanger::new(&config)?;
        let pending = MemoryPendingStore::new(config.state_ttl());
        Ok(Self::new(config, pending, MemorySessionStore::new(), exchanger))
    }
}

impl<P, S, E> Handshake<P, S, E>
where
    P: PendingHandshakeStore,
    S: SessionStore,
    E: CredentialExchanger,
{
    /// Assembles a handshake from its parts.
    pub fn new(config: HandshakeConfig, pending: P, sessions: S, exchanger: E) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                pending,
                sessions,
                exchanger,
            }),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HandshakeConfig {
        &self.inner.config
    }

    /// Starts a handshake for a claimed shop.
    ///
    /// # Errors
    ///
    /// [`HandshakeError::InvalidTenant`] if `shop` fails the tenant grammar,
    /// [`HandshakeError::Store`] if the pending record cannot be saved.
    pub async fn start(&self, shop: &str) -> Result<Started, HandshakeError> {
        let shop = self.inner.config.parse_shop(shop).map_err(|_| {
            tracing::warn!(error = "InvalidTenant", "handshake start rejected");
            HandshakeError::InvalidTenant
        })?;

        self.inner.pending.reclaim_expired().await;

        let result = begin_auth(&self.inner.config, &shop, Utc::now());
        let state = result.pending.state.clone();
        self.inner.pending.insert(result.pending).await.map_err(|e| {
            tracing::error!(shop = %shop, error = %e, "failed to persist pending handshake");
            HandshakeError::from(e)
        })?;

        tracing::info!(shop = %shop, "handshake started");
        Ok(Started {
            redirect_url: result.auth_url,
            state,
        })
    }

    /// Completes a handshake from the host's callback.
    ///
    /// `previous` is the session the browser currently holds, if any. It is
    /// deleted before the new session is saved; a failed delete is logged and
    /// does not fail the login.
    ///
    /// # Errors
    ///
    /// Any [`HandshakeError`] raised by the callback checks or the stores.
    pub async fn complete(
        &self,
        query: &CallbackQuery,
        cookie_state: Option<&str>,
        previous: Option<&SessionId>,
    ) -> Result<Completed, HandshakeError> {
        let inner = &self.inner;
        let session = validate_auth_callback(
            &inner.config,
            &inner.pending,
            &inner.exchanger,
            query,
            cookie_state,
            Utc::now(),
        )
        .await
        .inspect_err(|e| {
            if matches!(e, HandshakeError::Store(_)) {
                tracing::error!(error = %e, "handshake callback failed");
            } else {
                tracing::warn!(error = e.wire_name(), "handshake callback rejected");
            }
        })?;

        if let Some(previous) = previous.filter(|previous| **previous != session.id) {
            if let Err(e) = inner.sessions.delete(previous).await {
                tracing::warn!(
                    session = previous.redacted(),
                    error = %e,
                    "failed to delete replaced session"
                );
            }
        }
        inner.sessions.insert(session.clone()).await?;

        tracing::info!(
            shop = %session.shop,
            session = session.id.redacted(),
            "handshake completed"
        );

        Ok(Completed {
            redirect_to: format!("/?shop={}", urlencoding::encode(session.shop.as_ref())),
            session,
        })
    }

    /// Resolves the session a request refers to.
    ///
    /// Expired sessions are deleted on the way out.
    ///
    /// # Errors
    ///
    /// [`HandshakeError::SessionNotFound`] if there is no id or no such
    /// session, [`HandshakeError::SessionExpired`] if it has expired.
    pub async fn verify(&self, id: Option<&SessionId>) -> Result<Session, HandshakeError> {
        let id = id.ok_or(HandshakeError::SessionNotFound)?;
        let session = self
            .inner
            .sessions
            .get(id)
            .await?
            .ok_or(HandshakeError::SessionNotFound)?;

        if session.is_expired_at(Utc::now()) {
            self.inner.sessions.delete(id).await?;
            tracing::debug!(shop = %session.shop, "expired session removed");
            return Err(HandshakeError::SessionExpired);
        }

        Ok(session)
    }

    /// Ends a session. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// [`HandshakeError::Store`] if the store fails.
    pub async fn logout(&self, id: &SessionId) -> Result<(), HandshakeError> {
        self.inner.sessions.delete(id).await?;
        tracing::info!(session = id.redacted(), "session logged out");
        Ok(())
    }

    /// Revokes every session of `shop`.
    ///
    /// Called when the app is uninstalled, or when any call to the host sees
    /// the shop's credential rejected.
    ///
    /// # Errors
    ///
    /// [`HandshakeError::Store`] if the store fails.
    pub async fn revoke_shop(&self, shop: &ShopDomain) -> Result<usize, HandshakeError> {
        let revoked = self.inner.sessions.delete_shop(shop).await?;
        tracing::info!(shop = %shop, revoked, "shop sessions revoked");
        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::oauth::hmac::compute_signature;
    use crate::auth::oauth::ExchangeFailure;
    use crate::auth::session::AccessTokenResponse;
    use crate::config::{ApiKey, ApiSecretKey, HostUrl};
    use crate::store::StoreError;
    use std::time::Duration;

    struct StaticExchanger {
        expires_in: Option<u64>,
    }

    impl CredentialExchanger for StaticExchanger {
        async fn exchange(
            &self,
            _shop: &ShopDomain,
            _code: &str,
        ) -> Result<AccessTokenResponse, ExchangeFailure> {
            Ok(AccessTokenResponse {
                access_token: "shpat_static".to_string(),
                scope: "read_products".parse().unwrap(),
                expires_in: self.expires_in,
            })
        }
    }

    type TestHandshake = Handshake<MemoryPendingStore, MemorySessionStore, StaticExchanger>;

    fn config() -> HandshakeConfig {
        HandshakeConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .callback_url(HostUrl::new("https://app.example.com/auth/callback").unwrap())
            .scopes("read_products".parse().unwrap())
            .build()
            .unwrap()
    }

    fn handshake(expires_in: Option<u64>) -> TestHandshake {
        Handshake::new(
            config(),
            MemoryPendingStore::new(Duration::from_secs(600)),
            MemorySessionStore::new(),
            StaticExchanger { expires_in },
        )
    }

    fn callback(shop: &str, state: &str) -> CallbackQuery {
        let mut pairs = vec![
            ("code".to_string(), "c".to_string()),
            ("shop".to_string(), shop.to_string()),
            ("state".to_string(), state.to_string()),
        ];
        let hmac = compute_signature(
            &CallbackQuery::from_pairs(pairs.clone()).to_signable_string(),
            "secret",
        );
        pairs.push(("hmac".to_string(), hmac));
        CallbackQuery::from_pairs(pairs)
    }

    async fn login(hs: &TestHandshake, shop: &str, previous: Option<&SessionId>) -> Completed {
        let started = hs.start(shop).await.unwrap();
        let state = started.state.as_ref();
        hs.complete(&callback(shop, state), Some(state), previous)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_tenant() {
        let hs = handshake(None);
        let err = hs.start("acme.evil.com").await.unwrap_err();
        assert!(matches!(err, HandshakeError::InvalidTenant));
    }

    #[tokio::test]
    async fn test_complete_redirects_to_entry_point() {
        let hs = handshake(None);
        let completed = login(&hs, "acme.myshopify.com", None).await;

        assert_eq!(completed.redirect_to, "/?shop=acme.myshopify.com");
        let verified = hs.verify(Some(&completed.session.id)).await.unwrap();
        assert_eq!(verified.shop.as_ref(), "acme.myshopify.com");
    }

    #[tokio::test]
    async fn test_new_login_replaces_previous_session() {
        let hs = handshake(None);
        let first = login(&hs, "acme.myshopify.com", None).await;
        let second = login(&hs, "acme.myshopify.com", Some(&first.session.id)).await;

        assert!(matches!(
            hs.verify(Some(&first.session.id)).await,
            Err(HandshakeError::SessionNotFound)
        ));
        assert!(hs.verify(Some(&second.session.id)).await.is_ok());
    }

    /// Session store whose deletes always fail.
    struct UndeletableSessions(MemorySessionStore);

    impl SessionStore for UndeletableSessions {
        async fn insert(&self, session: Session) -> Result<(), StoreError> {
            self.0.insert(session).await
        }

        async fn get(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
            self.0.get(id).await
        }

        async fn delete(&self, _id: &SessionId) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("delete failed".to_string()))
        }

        async fn delete_shop(&self, shop: &ShopDomain) -> Result<usize, StoreError> {
            self.0.delete_shop(shop).await
        }
    }

    #[tokio::test]
    async fn test_failed_delete_of_previous_session_does_not_fail_login() {
        let hs = Handshake::new(
            config(),
            MemoryPendingStore::new(Duration::from_secs(600)),
            UndeletableSessions(MemorySessionStore::new()),
            StaticExchanger { expires_in: None },
        );
        let shop = "acme.myshopify.com";
        let previous = SessionId::generate();

        let started = hs.start(shop).await.unwrap();
        let state = started.state.as_ref();
        let completed = hs
            .complete(&callback(shop, state), Some(state), Some(&previous))
            .await
            .unwrap();

        assert!(hs.verify(Some(&completed.session.id)).await.is_ok());
    }

    #[tokio::test]
    async fn test_verify_without_cookie_or_unknown_id() {
        let hs = handshake(None);
        assert!(matches!(
            hs.verify(None).await,
            Err(HandshakeError::SessionNotFound)
        ));
        assert!(matches!(
            hs.verify(Some(&SessionId::generate())).await,
            Err(HandshakeError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn test_expired_session_is_deleted_on_read() {
        let hs = handshake(Some(1));
        let completed = login(&hs, "acme.myshopify.com", None).await;
        tokio::time::sleep(Duration::from_millis(1100)).await;

        let first = hs.verify(Some(&completed.session.id)).await.unwrap_err();
        assert!(first.is_unauthenticated());
        assert!(matches!(
            hs.verify(Some(&completed.session.id)).await,
            Err(HandshakeError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn test_logout_and_revoke() {
        let hs = handshake(None);
        let a = login(&hs, "acme.myshopify.com", None).await;
        let b = login(&hs, "acme.myshopify.com", None).await;
        let other = login(&hs, "other.myshopify.com", None).await;

        hs.logout(&a.session.id).await.unwrap();
        assert!(hs.verify(Some(&a.session.id)).await.is_err());

        let shop = hs.config().parse_shop("acme.myshopify.com").unwrap();
        assert_eq!(hs.revoke_shop(&shop).await.unwrap(), 1);
        assert!(hs.verify(Some(&b.session.id)).await.is_err());
        assert!(hs.verify(Some(&other.session.id)).await.is_ok());
    }
}

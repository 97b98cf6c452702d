//! Server-to-server exchange of an authorization code for a credential.
//!
//! The handshake depends on the [`CredentialExchanger`] trait rather than on
//! an HTTP client, so tests can substitute a fake. [`HttpCredentialExchanger`]
//! is the production implementation: it POSTs
//! `{client_id, client_secret, code}` to `https://{shop}/admin/oauth/access_token`.
//!
//! Failures are classified by [`ExchangeFailure::kind`]: a 4xx means the host
//! rejected the code; anything else is transient.

use std::future::Future;

use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::auth::oauth::error::ExchangeFailureKind;
use crate::auth::session::AccessTokenResponse;
use crate::config::{ApiKey, ApiSecretKey, HandshakeConfig, ShopDomain};

/// Exchanges an authorization code for an access credential.
pub trait CredentialExchanger: Send + Sync + 'static {
    /// Redeem `code` with the host for `shop`.
    fn exchange(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> impl Future<Output = Result<AccessTokenResponse, ExchangeFailure>> + Send;
}

/// Why an exchange failed. Carries status codes for logs, never bodies.
#[derive(Debug, Error)]
pub enum ExchangeFailure {
    /// The host answered with a client error.
    #[error("token endpoint rejected the code with status {0}")]
    Rejected(StatusCode),

    /// The host answered with a server error or other non-success status.
    #[error("token endpoint failed with status {0}")]
    Upstream(StatusCode),

    /// The request did not complete in time.
    #[error("token endpoint timed out")]
    Timeout,

    /// Connection or protocol error.
    #[error("token endpoint unreachable: {0}")]
    Network(String),

    /// The success body was not a usable token response.
    #[error("token endpoint returned an unreadable body")]
    MalformedBody,
}

impl ExchangeFailure {
    /// Classifies the failure for the caller.
    #[must_use]
    pub const fn kind(&self) -> ExchangeFailureKind {
        match self {
            Self::Rejected(_) => ExchangeFailureKind::Rejected,
            Self::Upstream(_) | Self::Timeout | Self::Network(_) | Self::MalformedBody => {
                ExchangeFailureKind::Transient
            }
        }
    }

    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_decode() {
            Self::MalformedBody
        } else {
            Self::Network(error.without_url().to_string())
        }
    }
}

#[derive(Serialize)]
struct TokenExchangeRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

/// Production exchanger backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct HttpCredentialExchanger {
    client: reqwest::Client,
    client_id: ApiKey,
    client_secret: ApiSecretKey,
    origin: Option<String>,
}

impl HttpCredentialExchanger {
    /// Builds an exchanger with the configured credentials and timeout.
    ///
    /// # Errors
    ///
    /// Returns the `reqwest` builder error if the TLS backend cannot be
    /// initialised.
    pub fn new(config: &HandshakeConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.exchange_timeout())
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            client_id: config.api_key().clone(),
            client_secret: config.api_secret_key().clone(),
            origin: None,
        })
    }

    /// Sends every exchange to `origin` instead of `https://{shop}`.
    ///
    /// Used to point the exchanger at a local mock server.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into().trim_end_matches('/').to_string());
        self
    }

    fn token_url(&self, shop: &ShopDomain) -> String {
        match &self.origin {
            Some(origin) => format!("{origin}/admin/oauth/access_token"),
            None => format!("https://{shop}/admin/oauth/access_token"),
        }
    }
}

impl CredentialExchanger for HttpCredentialExchanger {
    async fn exchange(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> Result<AccessTokenResponse, ExchangeFailure> {
        let body = TokenExchangeRequest {
            client_id: self.client_id.as_ref(),
            client_secret: self.client_secret.expose(),
            code,
        };

        let response = self
            .client
            .post(self.token_url(shop))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(ExchangeFailure::from_reqwest)?;

        let status = response.status();
        if status.is_client_error() {
            return Err(ExchangeFailure::Rejected(status));
        }
        if !status.is_success() {
            return Err(ExchangeFailure::Upstream(status));
        }

        let token: AccessTokenResponse = response
            .json()
            .await
            .map_err(ExchangeFailure::from_reqwest)?;

        if token.access_token.trim().is_empty() {
            return Err(ExchangeFailure::MalformedBody);
        }

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HostUrl, PlatformDomain};
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(timeout: Duration) -> HandshakeConfig {
        HandshakeConfig::builder()
            .api_key(ApiKey::new("client-id").unwrap())
            .api_secret_key(ApiSecretKey::new("client-secret").unwrap())
            .callback_url(HostUrl::new("https://app.example.com/auth/callback").unwrap())
            .scopes("read_products".parse().unwrap())
            .exchange_timeout(timeout)
            .build()
            .unwrap()
    }

    fn shop() -> ShopDomain {
        ShopDomain::parse("acme.myshopify.com", &PlatformDomain::default()).unwrap()
    }

    async fn exchanger(server: &MockServer, timeout: Duration) -> HttpCredentialExchanger {
        HttpCredentialExchanger::new(&config(timeout))
            .unwrap()
            .with_origin(server.uri())
    }

    #[tokio::test]
    async fn test_exchange_posts_credentials_and_parses_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/oauth/access_token"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "client_id": "client-id",
                "client_secret": "client-secret",
                "code": "auth-code"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "shpat_123",
                "scope": "read_products"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = exchanger(&server, Duration::from_secs(5))
            .await
            .exchange(&shop(), "auth-code")
            .await
            .unwrap();

        assert_eq!(token.access_token, "shpat_123");
        assert_eq!(token.scope.to_string(), "read_products");
        assert_eq!(token.expires_in, None);
    }

    #[tokio::test]
    async fn test_client_error_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_request"}"#),
            )
            .mount(&server)
            .await;

        let err = exchanger(&server, Duration::from_secs(5))
            .await
            .exchange(&shop(), "used-code")
            .await
            .unwrap_err();

        assert!(matches!(err, ExchangeFailure::Rejected(StatusCode::BAD_REQUEST)));
        assert_eq!(err.kind(), ExchangeFailureKind::Rejected);
        assert!(!err.to_string().contains("invalid_request"));
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = exchanger(&server, Duration::from_secs(5))
            .await
            .exchange(&shop(), "code")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ExchangeFailureKind::Transient);
    }

    #[tokio::test]
    async fn test_unparseable_body_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = exchanger(&server, Duration::from_secs(5))
            .await
            .exchange(&shop(), "code")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ExchangeFailureKind::Transient);
    }

    #[tokio::test]
    async fn test_empty_access_token_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "",
                "scope": "read_products"
            })))
            .mount(&server)
            .await;

        let err = exchanger(&server, Duration::from_secs(5))
            .await
            .exchange(&shop(), "code")
            .await
            .unwrap_err();

        assert!(matches!(err, ExchangeFailure::MalformedBody));
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(2))
                    .set_body_json(serde_json::json!({"access_token": "late"})),
            )
            .mount(&server)
            .await;

        let err = exchanger(&server, Duration::from_millis(200))
            .await
            .exchange(&shop(), "code")
            .await
            .unwrap_err();

        assert!(matches!(err, ExchangeFailure::Timeout));
        assert_eq!(err.kind(), ExchangeFailureKind::Transient);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transient() {
        let exchanger = HttpCredentialExchanger::new(&config(Duration::from_secs(2)))
            .unwrap()
            .with_origin("http://127.0.0.1:9");

        let err = exchanger.exchange(&shop(), "code").await.unwrap_err();
        assert_eq!(err.kind(), ExchangeFailureKind::Transient);
    }

    #[test]
    fn test_token_url_defaults_to_shop() {
        let exchanger = HttpCredentialExchanger::new(&config(Duration::from_secs(1))).unwrap();
        assert_eq!(
            exchanger.token_url(&shop()),
            "https://acme.myshopify.com/admin/oauth/access_token"
        );
    }
}

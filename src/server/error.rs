//! JSON error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::auth::oauth::HandshakeError;
use crate::webhooks::WebhookError;

/// Body of every error response: `{"error": ..., "message": ...}`.
#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    pub(crate) error: &'static str,
    pub(crate) message: String,
}

impl ErrorBody {
    pub(crate) fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl HandshakeError {
    /// HTTP status the error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameters | Self::InvalidTenant => StatusCode::BAD_REQUEST,
            Self::InvalidOrExpiredState | Self::SignatureInvalid => StatusCode::FORBIDDEN,
            Self::CredentialExchangeFailed(_) => StatusCode::BAD_GATEWAY,
            Self::SessionNotFound | Self::SessionExpired => StatusCode::UNAUTHORIZED,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HandshakeError {
    fn into_response(self) -> Response {
        ErrorBody {
            error: self.wire_name(),
            message: self.to_string(),
        }
        .into_response_with(self.status())
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::InvalidHmac => (StatusCode::UNAUTHORIZED, "InvalidHmac"),
            Self::InvalidShopDomain => (StatusCode::BAD_REQUEST, "InvalidShopDomain"),
            Self::UnexpectedTopic => (StatusCode::BAD_REQUEST, "UnexpectedTopic"),
        };
        ErrorBody {
            error,
            message: self.to_string(),
        }
        .into_response_with(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::oauth::ExchangeFailureKind;
    use crate::store::StoreError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (HandshakeError::MissingParameters, StatusCode::BAD_REQUEST),
            (HandshakeError::InvalidTenant, StatusCode::BAD_REQUEST),
            (HandshakeError::InvalidOrExpiredState, StatusCode::FORBIDDEN),
            (HandshakeError::SignatureInvalid, StatusCode::FORBIDDEN),
            (
                HandshakeError::CredentialExchangeFailed(ExchangeFailureKind::Rejected),
                StatusCode::BAD_GATEWAY,
            ),
            (
                HandshakeError::CredentialExchangeFailed(ExchangeFailureKind::Transient),
                StatusCode::BAD_GATEWAY,
            ),
            (HandshakeError::SessionNotFound, StatusCode::UNAUTHORIZED),
            (HandshakeError::SessionExpired, StatusCode::UNAUTHORIZED),
            (
                HandshakeError::Store(StoreError::Unavailable("down".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_webhook_status_mapping() {
        assert_eq!(
            WebhookError::InvalidHmac.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            WebhookError::InvalidShopDomain.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::UnexpectedTopic.into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_store_message_hides_backend_detail() {
        let error =
            HandshakeError::Store(StoreError::Unavailable("redis://secret@host".to_string()));
        let body = serde_json::to_string(&ErrorBody {
            error: error.wire_name(),
            message: error.to_string(),
        })
        .unwrap();
        assert!(!body.contains("redis"));
        assert!(body.contains(r#""error":"Store""#));
    }
}

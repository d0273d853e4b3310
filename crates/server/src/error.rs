//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`; the body is always `{"error": "<message>"}`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::ValidationError;
use crate::services::{AuthError, OrderError, PaymentError};

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication or authorization failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order lifecycle operation failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Payment processor operation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Request body failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::MissingCredential => StatusCode::UNAUTHORIZED,
                AuthError::InvalidToken
                | AuthError::Expired
                | AuthError::NotAdmin
                | AuthError::IdentityMismatch => StatusCode::FORBIDDEN,
                AuthError::Signing(_) | AuthError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Order(err) => match err {
                OrderError::NotFound => StatusCode::NOT_FOUND,
                OrderError::Forbidden => StatusCode::FORBIDDEN,
                OrderError::AlreadyPaid => StatusCode::CONFLICT,
                OrderError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Payment(err) => match err {
                PaymentError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Payment(_)
                | Self::Auth(AuthError::Signing(_) | AuthError::Repository(_))
                | Self::Order(OrderError::Repository(_))
        )
    }

    fn client_message(&self) -> String {
        // Don't expose internal error details to clients
        match self {
            Self::Database(_)
            | Self::Internal(_)
            | Self::Auth(AuthError::Signing(_) | AuthError::Repository(_))
            | Self::Order(OrderError::Repository(_)) => "Internal server error".to_string(),
            Self::Payment(PaymentError::NotConfigured) => {
                "Payments are not available".to_string()
            }
            Self::Payment(_) => "External service error".to_string(),
            Self::Auth(err) => match err {
                AuthError::MissingCredential => "Unauthorized access".to_string(),
                AuthError::NotAdmin | AuthError::IdentityMismatch => {
                    "Forbidden access".to_string()
                }
                _ => "Forbidden: invalid or expired token".to_string(),
            },
            Self::Order(err) => err.to_string(),
            Self::Validation(err) => err.to_string(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = Json(json!({ "error": self.client_message() }));
        (self.status(), body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from the verified identity.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("tool".to_string());
        assert_eq!(err.to_string(), "Not found: tool");

        let err = AppError::BadRequest("invalid id".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid id");
    }

    #[test]
    fn test_auth_status_codes() {
        assert_eq!(
            get_status(AuthError::MissingCredential.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AuthError::InvalidToken.into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(get_status(AuthError::Expired.into()), StatusCode::FORBIDDEN);
        assert_eq!(get_status(AuthError::NotAdmin.into()), StatusCode::FORBIDDEN);
        assert_eq!(
            get_status(AuthError::IdentityMismatch.into()),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_order_and_payment_status_codes() {
        assert_eq!(
            get_status(OrderError::NotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(OrderError::AlreadyPaid.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(PaymentError::NotConfigured.into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(PaymentError::Parse("bad".to_string()).into()),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_client_errors() {
        assert_eq!(
            get_status(ValidationError("rating".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::NotFound("tool".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Internal("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::Internal("connection refused at 10.0.0.3".to_string());
        assert_eq!(err.client_message(), "Internal server error");
    }
}

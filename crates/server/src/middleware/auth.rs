//! Authentication extractors.
//!
//! [`RequireAuth`] is the bearer-token gate; [`RequireAdmin`] runs it and
//! then checks the stored role. Both reject before the handler runs, so a
//! handler taking either one only ever sees a verified identity.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use tool_market_core::Email;

use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::services::AuthError;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// - No `Authorization: Bearer <token>` header: 401.
/// - Bad signature, expired token, or malformed claims: 403.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(email): RequireAuth) -> String {
///     format!("Hello, {email}!")
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub Email);

impl RequireAuth {
    /// Reject unless the verified identity is `email`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::IdentityMismatch` on a mismatch.
    pub fn ensure_is(&self, email: &Email) -> Result<(), AuthError> {
        if &self.0 != email {
            tracing::debug!(caller = %self.0, requested = %email, "Identity mismatch");
            return Err(AuthError::IdentityMismatch);
        }
        Ok(())
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            tracing::debug!(path = %parts.uri.path(), "Missing bearer credential");
            return Err(AuthError::MissingCredential.into());
        };

        let email = match state.tokens().verify(token) {
            Ok(email) => email,
            Err(err) => {
                tracing::debug!(path = %parts.uri.path(), reason = %err, "Bearer credential rejected");
                return Err(err.into());
            }
        };

        set_sentry_user(email.as_str());
        Ok(Self(email))
    }
}

/// Extractor that requires a valid bearer token for an admin identity.
///
/// An identity with no stored record is treated like a non-admin (403).
///
/// # Example
///
/// ```rust,ignore
/// async fn admin_handler(RequireAdmin(admin): RequireAdmin) -> String {
///     format!("Hello admin {}!", admin.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(email) = RequireAuth::from_request_parts(parts, state).await?;

        let user = state
            .store()
            .get_user(&email)
            .await
            .map_err(AuthError::from)?;

        match user {
            Some(user) if user.is_admin() => Ok(Self(user)),
            Some(_) => {
                tracing::debug!(%email, "Admin route refused for non-admin");
                Err(AuthError::NotAdmin.into())
            }
            // A valid token for an identity never upserted is still a 403.
            None => {
                tracing::debug!(%email, "Admin route refused for unknown identity");
                Err(AuthError::NotAdmin.into())
            }
        }
    }
}

/// The token from an `Authorization: Bearer <token>` header, if any.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

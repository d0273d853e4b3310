//! Identity route handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::Serialize;
use serde_json::{Value, json};
use tool_market_core::Role;

use super::parse_email;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{User, UserUpdate};
use crate::state::AppState;

/// Response of `PUT /user/{email}`.
#[derive(Debug, Serialize)]
pub struct UpsertUserResponse {
    pub user: User,
    pub created: bool,
    /// Bearer token for subsequent requests.
    pub token: String,
}

/// Create or update an identity and issue it a token.
///
/// This is the sign-in step: the client has already authenticated the
/// email with its identity provider.
pub async fn upsert(
    State(state): State<AppState>,
    Path(email): Path<String>,
    body: std::result::Result<Json<UserUpdate>, JsonRejection>,
) -> Result<Json<UpsertUserResponse>> {
    let email = parse_email(&email)?;
    let Json(update) = body?;

    let upserted = state
        .store()
        .upsert_user(&email, update.normalized())
        .await?;
    let token = state.tokens().sign(&email)?;

    if upserted.created {
        tracing::info!(%email, "Identity created");
    }

    Ok(Json(UpsertUserResponse {
        user: upserted.record,
        created: upserted.created,
        token,
    }))
}

/// List every identity.
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<User>>> {
    Ok(Json(state.store().list_users().await?))
}

/// Promote an existing identity to admin.
pub async fn promote(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(email): Path<String>,
) -> Result<Json<User>> {
    let email = parse_email(&email)?;
    let user = state
        .store()
        .set_role(&email, Role::Admin)
        .await?
        .ok_or_else(|| AppError::NotFound("user".to_string()))?;

    tracing::info!(%email, promoted_by = %admin.email, "Identity promoted to admin");
    Ok(Json(user))
}

/// Whether an identity is an admin. Unknown identities are not.
pub async fn is_admin(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Value>> {
    let email = parse_email(&email)?;
    let admin = state
        .store()
        .get_user(&email)
        .await?
        .is_some_and(|user| user.is_admin());
    Ok(Json(json!({ "admin": admin })))
}

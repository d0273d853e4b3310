//! Profile route handlers. Callers only see and edit their own profile.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use super::parse_email;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Profile, ProfileUpdate};
use crate::state::AppState;

/// Read the caller's profile.
pub async fn show(
    State(state): State<AppState>,
    caller: RequireAuth,
    Path(email): Path<String>,
) -> Result<Json<Profile>> {
    let email = parse_email(&email)?;
    caller.ensure_is(&email)?;

    let profile = state
        .store()
        .get_profile(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("profile".to_string()))?;
    Ok(Json(profile))
}

/// Create or update the caller's profile. Absent fields keep their value.
pub async fn upsert(
    State(state): State<AppState>,
    caller: RequireAuth,
    Path(email): Path<String>,
    body: std::result::Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<Profile>> {
    let email = parse_email(&email)?;
    caller.ensure_is(&email)?;
    let Json(update) = body?;

    let upserted = state
        .store()
        .upsert_profile(&email, update.normalized())
        .await?;
    Ok(Json(upserted.record))
}

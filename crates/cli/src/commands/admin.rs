//! Admin identity management.
//!
//! Promotion over HTTP needs an existing admin, so the first one is created
//! here, directly against the database.

use thiserror::Error;
use tool_market_core::{Email, EmailError, Role};
use tool_market_server::db::{PgStore, RepositoryError, Store};
use tool_market_server::models::UserUpdate;

use super::{CommandError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Repository error.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// The identity vanished between upsert and promotion.
    #[error("Identity not found: {0}")]
    NotFound(String),
}

/// Create the identity if it does not exist, then give it the admin role.
pub async fn promote(email: &str) -> Result<(), AdminError> {
    let email = Email::parse(email)?;
    let store = PgStore::new(connect().await?);

    let upserted = store.upsert_user(&email, UserUpdate::default()).await?;
    if upserted.created {
        tracing::info!(%email, "Identity created");
    }

    let user = store
        .set_role(&email, Role::Admin)
        .await?
        .ok_or_else(|| AdminError::NotFound(email.to_string()))?;

    tracing::info!(email = %user.email, role = %user.role, "Identity promoted");
    Ok(())
}

//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur while authenticating or authorizing a request.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization: Bearer <token>` header on the request.
    #[error("missing bearer credential")]
    MissingCredential,

    /// Signature, algorithm or claims did not verify.
    #[error("invalid token")]
    InvalidToken,

    /// The token verified but is past its expiry.
    #[error("token expired")]
    Expired,

    /// The caller's stored role is not admin, or the caller is unknown.
    #[error("admin role required")]
    NotAdmin,

    /// The verified identity does not match the requested resource owner.
    #[error("identity does not match requested resource")]
    IdentityMismatch,

    /// Token could not be signed.
    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

//! Review route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{NewReview, Review};
use crate::state::AppState;

/// List reviews, newest first.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Review>>> {
    Ok(Json(state.store().list_reviews().await?))
}

/// Post a review as the caller.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(author): RequireAuth,
    body: std::result::Result<Json<NewReview>, JsonRejection>,
) -> Result<(StatusCode, Json<Review>)> {
    let Json(review) = body?;
    let review = state
        .store()
        .create_review(&author, review.validated()?)
        .await?;

    tracing::info!(review_id = %review.id, rating = review.rating, "Review posted");
    Ok((StatusCode::CREATED, Json(review)))
}

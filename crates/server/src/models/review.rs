//! Customer reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tool_market_core::{Email, ReviewId};

use super::{ValidationError, non_blank};

/// Lowest and highest accepted star rating.
pub const RATING_RANGE: std::ops::RangeInclusive<i32> = 1..=5;

/// A review posted by a verified identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: ReviewId,
    pub email: Email,
    pub name: Option<String>,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /reviews`. The author is the caller, never the body.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    #[serde(default)]
    pub name: Option<String>,
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
}

impl NewReview {
    /// # Errors
    ///
    /// Returns `ValidationError` when the rating is outside `1..=5` or the
    /// comment is blank.
    pub fn validated(self) -> Result<Self, ValidationError> {
        if !RATING_RANGE.contains(&self.rating) {
            return Err(ValidationError::new("rating must be between 1 and 5"));
        }
        let comment = self.comment.trim().to_owned();
        if comment.is_empty() {
            return Err(ValidationError::new("comment cannot be empty"));
        }
        Ok(Self {
            name: non_blank(self.name),
            rating: self.rating,
            comment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        for (rating, ok) in [(0, false), (1, true), (5, true), (6, false)] {
            let review = NewReview {
                name: None,
                rating,
                comment: "solid".to_owned(),
            };
            assert_eq!(review.validated().is_ok(), ok, "rating {rating}");
        }
    }
}

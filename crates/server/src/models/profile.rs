//! Purchaser profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tool_market_core::Email;

use super::non_blank;

/// Free-form profile details, one per email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub email: Email,
    pub name: Option<String>,
    pub education: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `PUT /profile_update/{email}`.
///
/// Absent or blank fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
}

impl ProfileUpdate {
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            name: non_blank(self.name),
            education: non_blank(self.education),
            location: non_blank(self.location),
            phone: non_blank(self.phone),
            linkedin: non_blank(self.linkedin),
        }
    }

    /// Apply this update on top of an existing profile (or a fresh one).
    #[must_use]
    pub fn apply(self, email: &Email, existing: Option<Profile>, now: DateTime<Utc>) -> Profile {
        let base = existing.unwrap_or_else(|| Profile {
            email: email.clone(),
            name: None,
            education: None,
            location: None,
            phone: None,
            linkedin: None,
            updated_at: now,
        });
        Profile {
            email: base.email,
            name: self.name.or(base.name),
            education: self.education.or(base.education),
            location: self.location.or(base.location),
            phone: self.phone.or(base.phone),
            linkedin: self.linkedin.or(base.linkedin),
            updated_at: now,
        }
    }
}

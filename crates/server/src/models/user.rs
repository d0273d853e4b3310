//! Marketplace identities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tool_market_core::{Email, Role};

use super::non_blank;

/// An identity known to the marketplace.
///
/// Created by the first `PUT /user/{email}`; the role only ever changes by
/// promotion to admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: Email,
    pub name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether this identity passes the admin gate.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Body of `PUT /user/{email}`.
///
/// Unknown fields, including any `role`, are ignored so a client cannot
/// grant itself privileges through the upsert.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub name: Option<String>,
}

impl UserUpdate {
    /// Drop blank values so they do not overwrite stored ones.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            name: non_blank(self.name),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_in_body_is_ignored() {
        let update: UserUpdate =
            serde_json::from_str(r#"{"name":"Ann","role":"admin"}"#).unwrap();
        assert_eq!(update.name.as_deref(), Some("Ann"));
    }

    #[test]
    fn test_blank_name_normalized_away() {
        let update = UserUpdate {
            name: Some("  ".to_owned()),
        };
        assert_eq!(update.normalized().name, None);
    }
}

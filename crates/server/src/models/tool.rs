//! Catalog tools.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tool_market_core::{Price, ToolId};

use super::{ValidationError, non_blank, storable_price};

/// A tool listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    #[serde(rename = "_id")]
    pub id: ToolId,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    /// Unit price.
    pub price: Price,
    pub min_order_quantity: i32,
    pub available_quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /tools` and entries of the seed file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    pub price: Price,
    #[serde(default = "default_min_order")]
    pub min_order_quantity: i32,
    pub available_quantity: i32,
}

const fn default_min_order() -> i32 {
    1
}

impl NewTool {
    /// Normalize text fields and check the quantity invariants.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when the name is blank or the quantities do
    /// not satisfy `1 <= minOrderQuantity <= availableQuantity`, or when the
    /// price has fractions of a cent or exceeds the stored range.
    pub fn validated(self) -> Result<Self, ValidationError> {
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(ValidationError::new("tool name cannot be empty"));
        }
        if self.min_order_quantity < 1 {
            return Err(ValidationError::new("minOrderQuantity must be at least 1"));
        }
        if self.available_quantity < self.min_order_quantity {
            return Err(ValidationError::new(
                "availableQuantity cannot be below minOrderQuantity",
            ));
        }
        let price = storable_price(self.price)?;

        Ok(Self {
            name,
            price,
            description: self.description.trim().to_owned(),
            image: non_blank(self.image),
            ..self
        })
    }
}

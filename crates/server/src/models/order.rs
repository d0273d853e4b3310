//! Orders and their lifecycle stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tool_market_core::{Email, OrderId, Price};

use super::{ValidationError, non_blank, storable_price};

/// A purchase of one catalog tool by one purchaser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub tool_name: String,
    /// Purchaser identity.
    pub email: Email,
    pub customer_name: Option<String>,
    pub quantity: i32,
    pub price: Price,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    /// Absent until an admin accepts the order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_accept: Option<bool>,
    pub created_at: DateTime<Utc>,
}

/// Where an order sits in its lifecycle.
///
/// Payment and admin acceptance are independent, so both orders of arrival
/// lead to [`OrderStage::PaidAndAccepted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStage {
    Created,
    Paid,
    Accepted,
    PaidAndAccepted,
}

impl std::fmt::Display for OrderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Paid => write!(f, "paid"),
            Self::Accepted => write!(f, "accepted"),
            Self::PaidAndAccepted => write!(f, "paid_and_accepted"),
        }
    }
}

impl Order {
    /// Current lifecycle stage.
    #[must_use]
    pub fn stage(&self) -> OrderStage {
        match (self.paid, self.admin_accept == Some(true)) {
            (false, false) => OrderStage::Created,
            (true, false) => OrderStage::Paid,
            (false, true) => OrderStage::Accepted,
            (true, true) => OrderStage::PaidAndAccepted,
        }
    }

    /// Whether `email` is the purchaser of this order.
    #[must_use]
    pub fn is_purchased_by(&self, email: &Email) -> bool {
        &self.email == email
    }
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub tool_name: String,
    pub email: Email,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub price: Price,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

const fn default_quantity() -> i32 {
    1
}

impl NewOrder {
    /// Normalize text fields and check the quantity.
    ///
    /// The tool name is trimmed so `"Drill"` and `"Drill "` count as the same
    /// (tool, purchaser) pair for the duplicate guard.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank tool name, a quantity below 1, or
    /// a price with fractions of a cent or beyond the stored range.
    pub fn validated(self) -> Result<Self, ValidationError> {
        let tool_name = self.tool_name.trim().to_owned();
        if tool_name.is_empty() {
            return Err(ValidationError::new("toolName cannot be empty"));
        }
        if self.quantity < 1 {
            return Err(ValidationError::new("quantity must be at least 1"));
        }
        let price = storable_price(self.price)?;

        Ok(Self {
            tool_name,
            price,
            customer_name: non_blank(self.customer_name),
            address: non_blank(self.address),
            phone: non_blank(self.phone),
            ..self
        })
    }
}

/// Body of `PATCH /orders/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    pub transaction_id: String,
}

impl PaymentConfirmation {
    /// # Errors
    ///
    /// Returns `ValidationError` when the transaction id is blank.
    pub fn validated(self) -> Result<Self, ValidationError> {
        let transaction_id = self.transaction_id.trim().to_owned();
        if transaction_id.is_empty() {
            return Err(ValidationError::new("transactionId cannot be empty"));
        }
        Ok(Self { transaction_id })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order(paid: bool, admin_accept: Option<bool>) -> Order {
        Order {
            id: OrderId::new_random(),
            tool_name: "Drill".to_owned(),
            email: Email::parse("a@x.com").unwrap(),
            customer_name: None,
            quantity: 1,
            price: Price::ZERO,
            address: None,
            phone: None,
            paid,
            transaction_id: None,
            admin_accept,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_stage() {
        assert_eq!(order(false, None).stage(), OrderStage::Created);
        assert_eq!(order(true, None).stage(), OrderStage::Paid);
        assert_eq!(order(false, Some(true)).stage(), OrderStage::Accepted);
        assert_eq!(order(true, Some(true)).stage(), OrderStage::PaidAndAccepted);
    }

    #[test]
    fn test_new_order_serializes_without_optional_flags() {
        let json = serde_json::to_value(order(false, None)).unwrap();
        assert_eq!(json["paid"], false);
        assert_eq!(json["toolName"], "Drill");
        assert!(json.get("adminAccept").is_none());
        assert!(json.get("transactionId").is_none());
        assert!(json.get("_id").is_some());
    }

    #[test]
    fn test_new_order_defaults_and_validation() {
        let body: NewOrder = serde_json::from_value(serde_json::json!({
            "toolName": " Drill ",
            "email": "a@x.com",
            "price": 10
        }))
        .unwrap();
        let body = body.validated().unwrap();
        assert_eq!(body.tool_name, "Drill");
        assert_eq!(body.quantity, 1);

        let zero: NewOrder = serde_json::from_value(serde_json::json!({
            "toolName": "Drill",
            "email": "a@x.com",
            "price": 10,
            "quantity": 0
        }))
        .unwrap();
        assert!(zero.validated().is_err());
    }

    #[test]
    fn test_unstorable_price_rejected() {
        for price in ["10.005", "99999999999999999999"] {
            let body: NewOrder = serde_json::from_value(serde_json::json!({
                "toolName": "Drill",
                "email": "a@x.com",
                "price": price
            }))
            .unwrap();
            assert!(body.validated().is_err(), "{price} should be rejected");
        }
    }

    #[test]
    fn test_blank_transaction_rejected() {
        let body = PaymentConfirmation {
            transaction_id: "  ".to_owned(),
        };
        assert!(body.validated().is_err());
    }
}

//! Payment log entries.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tool_market_core::{Email, OrderId, PaymentId, Price};

/// Immutable record written alongside each successful payment confirmation.
///
/// Entries are never updated and survive deletion of their order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    #[serde(rename = "_id")]
    pub id: PaymentId,
    pub order_id: OrderId,
    pub transaction_id: String,
    pub email: Email,
    pub amount: Price,
    pub created_at: DateTime<Utc>,
}

//! Domain models for the marketplace.
//!
//! Records serialize with camelCase field names and expose their ID as
//! `_id`, which is the shape existing marketplace clients consume.
//! Request bodies (`New*`, `*Update`) carry their own validation.

pub mod order;
pub mod payment;
pub mod profile;
pub mod review;
pub mod tool;
pub mod user;

pub use order::{NewOrder, Order, OrderStage, PaymentConfirmation};
pub use payment::PaymentRecord;
pub use profile::{Profile, ProfileUpdate};
pub use review::{NewReview, Review};
pub use tool::{NewTool, Tool};
pub use user::{User, UserUpdate};

use thiserror::Error;
use tool_market_core::Price;

/// A request body failed validation.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub(crate) fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Largest price the `NUMERIC(12, 2)` price columns hold, in cents.
const MAX_PRICE_MINOR_UNITS: i64 = 999_999_999_999;

/// Reject prices the price columns would round or overflow.
pub(crate) fn storable_price(price: Price) -> Result<Price, ValidationError> {
    let cents = price
        .to_minor_units()
        .map_err(|e| ValidationError::new(e.to_string()))?;
    if cents > MAX_PRICE_MINOR_UNITS {
        return Err(ValidationError::new(format!("price {price} is too large")));
    }
    Ok(price)
}

/// Trim an optional text field, dropping it when blank.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

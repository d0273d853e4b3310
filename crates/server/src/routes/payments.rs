//! Payment intent handler.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use tool_market_core::Price;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Payments are charged in US dollars only.
const CURRENCY: &str = "usd";

/// Body of `POST /create-payment-intent`.
#[derive(Debug, Deserialize)]
pub struct PaymentIntentRequest {
    pub price: Price,
}

/// Response of `POST /create-payment-intent`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

/// Create a card payment intent for `price` and return its client secret.
pub async fn create_intent(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    body: std::result::Result<Json<PaymentIntentRequest>, JsonRejection>,
) -> Result<Json<PaymentIntentResponse>> {
    let Json(request) = body?;
    if request.price.is_zero() {
        return Err(AppError::BadRequest("price must be positive".to_string()));
    }
    let amount = request
        .price
        .to_minor_units()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let client_secret = state
        .payments()
        .create_payment_intent(amount, CURRENCY)
        .await?;

    tracing::info!(email = %caller, amount_minor = amount, "Payment intent created");
    Ok(Json(PaymentIntentResponse { client_secret }))
}

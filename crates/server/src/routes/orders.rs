//! Purchaser-facing order handlers.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tool_market_core::OrderId;

use super::{parse_email, parse_id};
use crate::db::PlaceOrder;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{NewOrder, Order, PaymentConfirmation};
use crate::services::OrderService;
use crate::state::AppState;

/// Response of `POST /orders`.
///
/// `success` is `false` when an order for the same tool already existed;
/// `order` is then that existing order.
#[derive(Debug, Serialize)]
pub struct PlaceOrderResponse {
    pub success: bool,
    pub order: Order,
}

/// Query of `GET /orders`.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub email: Option<String>,
}

/// Place an order for the caller.
pub async fn place(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    body: std::result::Result<Json<NewOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<PlaceOrderResponse>)> {
    let Json(order) = body?;
    let placed = OrderService::new(state.store())
        .place(&caller, order.validated()?)
        .await?;

    let response = match placed {
        PlaceOrder::Created(order) => (
            StatusCode::CREATED,
            Json(PlaceOrderResponse {
                success: true,
                order,
            }),
        ),
        PlaceOrder::Existing(order) => (
            StatusCode::OK,
            Json(PlaceOrderResponse {
                success: false,
                order,
            }),
        ),
    };
    Ok(response)
}

/// List the caller's orders. `email` must be the caller's own.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<Vec<Order>>> {
    let raw = query
        .email
        .ok_or_else(|| AppError::BadRequest("missing email query parameter".to_string()))?;
    let purchaser = parse_email(&raw)?;

    let orders = OrderService::new(state.store())
        .list_for(&caller, &purchaser)
        .await?;
    Ok(Json(orders))
}

/// Show one order.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Order>> {
    let id: OrderId = parse_id(&id)?;
    let order = OrderService::new(state.store()).get(&caller, id).await?;
    Ok(Json(order))
}

/// Confirm payment of an order with the processor's transaction id.
pub async fn confirm_payment(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<String>,
    body: std::result::Result<Json<PaymentConfirmation>, JsonRejection>,
) -> Result<Json<Order>> {
    let id: OrderId = parse_id(&id)?;
    let Json(confirmation) = body?;
    let confirmation = confirmation.validated()?;

    let order = OrderService::new(state.store())
        .confirm_payment(&caller, id, &confirmation.transaction_id)
        .await?;
    Ok(Json(order))
}

/// Cancel an order.
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id: OrderId = parse_id(&id)?;
    OrderService::new(state.store()).cancel(&caller, id).await?;
    Ok(Json(json!({ "deleted": true })))
}

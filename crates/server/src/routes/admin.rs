//! Order administration handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tool_market_core::OrderId;

use super::parse_id;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::{Order, PaymentRecord};
use crate::services::OrderService;
use crate::state::AppState;

/// List every order.
pub async fn orders(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.store().list_orders().await?))
}

/// Accept an order, paid or not.
pub async fn accept_order(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Order>> {
    let id: OrderId = parse_id(&id)?;
    let order = OrderService::new(state.store()).accept(id).await?;

    tracing::debug!(order_id = %id, admin = %admin.email, "Acceptance recorded");
    Ok(Json(order))
}

/// Payment log of an order.
pub async fn order_payments(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Vec<PaymentRecord>>> {
    let id: OrderId = parse_id(&id)?;
    let payments = OrderService::new(state.store()).payments(id).await?;
    Ok(Json(payments))
}

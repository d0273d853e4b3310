//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::{Value, json};
use tool_market_core::ToolId;

use super::parse_id;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{NewTool, Tool};
use crate::state::AppState;

/// List the catalog.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Tool>>> {
    Ok(Json(state.store().list_tools().await?))
}

/// Show one tool.
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Tool>> {
    let id: ToolId = parse_id(&id)?;
    let tool = state
        .store()
        .get_tool(id)
        .await?
        .ok_or_else(|| AppError::NotFound("tool".to_string()))?;
    Ok(Json(tool))
}

/// Add a tool to the catalog.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    body: std::result::Result<Json<NewTool>, JsonRejection>,
) -> Result<(StatusCode, Json<Tool>)> {
    let Json(tool) = body?;
    let tool = state.store().create_tool(tool.validated()?).await?;

    tracing::info!(tool_id = %tool.id, name = %tool.name, admin = %admin.email, "Tool added");
    Ok((StatusCode::CREATED, Json(tool)))
}

/// Remove a tool from the catalog.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id: ToolId = parse_id(&id)?;
    if !state.store().delete_tool(id).await? {
        return Err(AppError::NotFound("tool".to_string()));
    }

    tracing::info!(tool_id = %id, admin = %admin.email, "Tool removed");
    Ok(Json(json!({ "deleted": true })))
}

//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! tools:
//!   - name: Cordless Drill
//!     description: 18V brushless drill
//!     image: https://example.com/drill.png
//!     price: "89.99"
//!     minOrderQuantity: 10
//!     availableQuantity: 500
//! ```
//!
//! Tools whose name already exists are skipped, so the command can be re-run.

use std::path::Path;

use serde::Deserialize;
use tool_market_server::db::{PgStore, Store};
use tool_market_server::models::NewTool;

use super::connect;

#[derive(Debug, Deserialize)]
struct SeedFile {
    tools: Vec<NewTool>,
}

/// Parse and validate every entry before anything is written.
fn parse(content: &str) -> Result<Vec<NewTool>, Box<dyn std::error::Error>> {
    let file: SeedFile = serde_yaml::from_str(content)?;
    let mut tools = Vec::with_capacity(file.tools.len());
    for (index, tool) in file.tools.into_iter().enumerate() {
        let tool = tool
            .validated()
            .map_err(|e| format!("tools[{index}]: {e}"))?;
        tools.push(tool);
    }
    Ok(tools)
}

/// Seed catalog tools from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, any entry is
/// invalid, or database operations fail.
pub async fn tools(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    tracing::info!(path = %file_path, "Loading tools from file");
    let content = tokio::fs::read_to_string(path).await?;
    let tools = parse(&content)?;
    tracing::info!(tools = tools.len(), "Parsed seed file");

    let store = PgStore::new(connect().await?);

    let mut inserted = 0usize;
    let mut skipped = 0usize;
    for tool in tools {
        if store.find_tool_by_name(&tool.name).await?.is_some() {
            tracing::debug!(name = %tool.name, "Tool exists, skipping");
            skipped += 1;
            continue;
        }
        let tool = store.create_tool(tool).await?;
        tracing::info!(tool_id = %tool.id, name = %tool.name, "Tool inserted");
        inserted += 1;
    }

    tracing::info!(inserted, skipped, "Seeding complete");
    Ok(())
}

//! Flags inventory items at or below their minimum stock level.

use crate::agents::{Agent, AgentError, AgentResult, RunContext};
use crate::care_store::{CareStore, FullCareStore, InventoryItem};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub struct LowStockAuditAgent {
    store: Arc<dyn FullCareStore>,
}

impl LowStockAuditAgent {
    pub fn new(store: Arc<dyn FullCareStore>) -> Self {
        Self { store }
    }
}

fn summarize(low: &[InventoryItem]) -> String {
    if low.is_empty() {
        return "All inventory items are above minimum stock".to_string();
    }
    let items = low
        .iter()
        .map(|item| {
            format!(
                "{} ({}/{} {})",
                item.name, item.stock, item.min_stock, item.unit
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} item(s) low on stock: {}", low.len(), items)
}

#[async_trait]
impl Agent for LowStockAuditAgent {
    fn id(&self) -> &'static str {
        "low-stock-audit"
    }

    fn name(&self) -> &'static str {
        "Low Stock Audit"
    }

    fn schedule_description(&self) -> Option<&'static str> {
        Some("Every day at 08:00")
    }

    async fn run(&self, ctx: &RunContext) -> Result<AgentResult, AgentError> {
        let low: Vec<InventoryItem> = self
            .store
            .get_inventory_items()
            .await?
            .into_iter()
            .filter(InventoryItem::is_low)
            .collect();

        let summary = summarize(&low);
        info!("[{}] {}", ctx.run_id, summary);

        Ok(AgentResult::ok(
            summary.clone(),
            json!({
                "count": low.len(),
                "items": low,
                "summary": summary,
            }),
        ))
    }
}

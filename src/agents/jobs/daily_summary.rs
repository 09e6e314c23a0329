//! End-of-day digest of logged care activity, tasks and occupancy.

use super::today_window;
use crate::agents::{Agent, AgentError, AgentResult, RunContext};
use crate::care_store::{CareStore, FullCareStore, LogType};
use crate::notifications::{NewNotification, NotificationStore};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde_json::{json, Map, Value as JsonValue};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

pub struct DailySummaryAgent {
    store: Arc<dyn FullCareStore>,
}

impl DailySummaryAgent {
    pub fn new(store: Arc<dyn FullCareStore>) -> Self {
        Self { store }
    }

    /// Summarizes the local day containing `now`.
    pub(crate) async fn summarize_day(
        &self,
        ctx: &RunContext,
        now: DateTime<Local>,
    ) -> Result<AgentResult, AgentError> {
        let (start, end) = today_window(now);
        let date = now.format("%Y-%m-%d").to_string();

        let logs = self.store.get_activity_logs_between(start, end).await?;
        let tasks_completed = self.store.count_completed_tasks_between(start, end).await?;
        let pending_tasks = self.store.count_pending_tasks().await?;
        let resident_count = self.store.count_residents().await?;

        let mut counts: HashMap<LogType, usize> = HashMap::new();
        for log in &logs {
            *counts.entry(log.log_type).or_default() += 1;
        }

        let mut lines = vec![
            format!("Daily summary for {}", date),
            format!("Activity logs: {}", logs.len()),
        ];
        let mut logs_by_type = Map::new();
        for log_type in LogType::ALL {
            let n = counts.get(&log_type).copied().unwrap_or(0);
            lines.push(format!("  {}: {}", log_type.label(), n));
            logs_by_type.insert(log_type.as_str().to_string(), JsonValue::from(n));
        }
        lines.push(format!("Tasks completed today: {}", tasks_completed));
        lines.push(format!("Pending tasks: {}", pending_tasks));
        lines.push(format!("Residents: {}", resident_count));
        let message = lines.join("\n");

        let notification = self
            .store
            .create_notification(NewNotification::info(
                format!("Daily Summary - {}", date),
                message.clone(),
            ))
            .await?;

        info!(
            "[{}] Daily summary for {}: {} logs, notification {}",
            ctx.run_id,
            date,
            logs.len(),
            notification.id
        );

        Ok(AgentResult::ok(
            message,
            json!({
                "date": date,
                "totalLogs": logs.len(),
                "logsByType": logs_by_type,
                "tasksCompleted": tasks_completed,
                "pendingTasks": pending_tasks,
                "residentCount": resident_count,
                "notificationId": notification.id,
            }),
        ))
    }
}

#[async_trait]
impl Agent for DailySummaryAgent {
    fn id(&self) -> &'static str {
        "daily-summary"
    }

    fn name(&self) -> &'static str {
        "Daily Summary"
    }

    fn schedule_description(&self) -> Option<&'static str> {
        Some("Every day at 20:00")
    }

    async fn run(&self, ctx: &RunContext) -> Result<AgentResult, AgentError> {
        self.summarize_day(ctx, Local::now()).await
    }
}

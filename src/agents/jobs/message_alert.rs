//! Alerts on family message threads left waiting for a staff reply.

use crate::agents::{Agent, AgentError, AgentResult, RunContext};
use crate::care_store::{CareStore, FullCareStore};
use crate::notifications::{NewNotification, NotificationStore};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// A thread whose newest family message is older than this is unanswered.
pub const UNANSWERED_THRESHOLD_HOURS: i64 = 2;

const SECONDS_PER_HOUR: i64 = 3600;

pub struct MessageAlertAgent {
    store: Arc<dyn FullCareStore>,
}

impl MessageAlertAgent {
    pub fn new(store: Arc<dyn FullCareStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Agent for MessageAlertAgent {
    fn id(&self) -> &'static str {
        "message-alert"
    }

    fn name(&self) -> &'static str {
        "Unanswered Message Alert"
    }

    fn schedule_description(&self) -> Option<&'static str> {
        Some("Every hour")
    }

    async fn run(&self, ctx: &RunContext) -> Result<AgentResult, AgentError> {
        let now = Utc::now().timestamp();
        let threads = self.store.get_residents_with_latest_family_message().await?;

        let mut unanswered = Vec::new();
        for thread in &threads {
            let latest = &thread.latest_message;
            let elapsed = now - latest.created_at;
            if !latest.from_family || elapsed <= UNANSWERED_THRESHOLD_HOURS * SECONDS_PER_HOUR {
                continue;
            }

            let hours = elapsed / SECONDS_PER_HOUR;
            self.store
                .create_notification(NewNotification::warning(
                    format!("Unanswered Message: {}", thread.resident_name),
                    format!(
                        "{} wrote about {} {} hour(s) ago and has not received a reply.",
                        latest.author_name, thread.resident_name, hours
                    ),
                ))
                .await?;
            unanswered.push(json!({
                "residentId": thread.resident_id,
                "residentName": thread.resident_name,
                "author": latest.author_name,
                "messageId": latest.id,
                "hoursWaiting": hours,
            }));
        }

        let message = if unanswered.is_empty() {
            "No unanswered family messages".to_string()
        } else {
            format!("Found {} unanswered family message(s)", unanswered.len())
        };
        info!(
            "[{}] {} ({} threads checked)",
            ctx.run_id,
            message,
            threads.len()
        );

        Ok(AgentResult::ok(
            message,
            json!({
                "count": unanswered.len(),
                "unanswered": unanswered,
            }),
        ))
    }
}

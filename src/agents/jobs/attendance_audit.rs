//! Reports staff who checked in today and never checked out.

use super::{format_local_time, today_window};
use crate::agents::{Agent, AgentError, AgentResult, RunContext};
use crate::care_store::{CareStore, FullCareStore};
use crate::notifications::{NewNotification, NotificationStore};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub struct AttendanceAuditAgent {
    store: Arc<dyn FullCareStore>,
}

impl AttendanceAuditAgent {
    pub fn new(store: Arc<dyn FullCareStore>) -> Self {
        Self { store }
    }

    /// Audits shifts opened during the local day containing `now`.
    pub(crate) async fn audit_day(
        &self,
        ctx: &RunContext,
        now: DateTime<Local>,
    ) -> Result<AgentResult, AgentError> {
        let (start, end) = today_window(now);
        let open_shifts = self.store.get_open_attendance_between(start, end).await?;

        if open_shifts.is_empty() {
            info!("[{}] No open shifts today", ctx.run_id);
            return Ok(AgentResult::ok(
                "All staff have checked out today",
                json!({ "count": 0, "openShifts": [] }),
            ));
        }

        let mut details = Vec::with_capacity(open_shifts.len());
        for shift in &open_shifts {
            let check_in = format_local_time(shift.check_in, "%H:%M");
            self.store
                .create_notification(NewNotification::warning(
                    format!("Open Shift: {}", shift.staff_name),
                    format!(
                        "{} checked in at {} and has not checked out.",
                        shift.staff_name, check_in
                    ),
                ))
                .await?;
            details.push(json!({
                "attendanceId": shift.id,
                "staffId": shift.staff_id,
                "staffName": shift.staff_name,
                "checkIn": check_in,
            }));
        }

        let message = format!("Found {} open shift(s)", open_shifts.len());
        info!("[{}] {}", ctx.run_id, message);

        Ok(AgentResult::ok(
            message,
            json!({
                "count": open_shifts.len(),
                "openShifts": details,
            }),
        ))
    }
}

#[async_trait]
impl Agent for AttendanceAuditAgent {
    fn id(&self) -> &'static str {
        "attendance-audit"
    }

    fn name(&self) -> &'static str {
        "Attendance Audit"
    }

    fn schedule_description(&self) -> Option<&'static str> {
        Some("Every day at 23:00")
    }

    async fn run(&self, ctx: &RunContext) -> Result<AgentResult, AgentError> {
        self.audit_day(ctx, Local::now()).await
    }
}

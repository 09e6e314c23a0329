mod models;
mod schema;
mod sqlite_care_store;

pub use models::*;
pub use schema::CARE_VERSIONED_SCHEMAS;
pub use sqlite_care_store::SqliteCareStore;

use crate::notifications::NotificationStore;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Read access to the operational state of the facility.
///
/// Time ranges are half-open: `start` inclusive, `end` exclusive.
#[async_trait]
pub trait CareStore: Send + Sync {
    async fn get_inventory_items(&self) -> Result<Vec<InventoryItem>>;

    /// Log entries created within the range, oldest first.
    async fn get_activity_logs_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ActivityLogEntry>>;

    async fn count_completed_tasks_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<usize>;

    async fn count_pending_tasks(&self) -> Result<usize>;

    async fn count_residents(&self) -> Result<usize>;

    /// Attendance rows created within the range that have no check-out.
    async fn get_open_attendance_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<OpenAttendance>>;

    /// Every resident with at least one family thread message, each paired
    /// with the single most recent one.
    async fn get_residents_with_latest_family_message(&self) -> Result<Vec<ResidentLatestMessage>>;
}

/// Everything an agent may touch.
pub trait FullCareStore: CareStore + NotificationStore {}

impl<T: CareStore + NotificationStore> FullCareStore for T {}

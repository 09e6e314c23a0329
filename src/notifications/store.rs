use anyhow::Result;
use async_trait::async_trait;

use super::models::{NewNotification, Notification};

/// Append-only sink for notifications. Agents never update or delete.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Persists a notification and returns it with its id and timestamp set.
    /// `read` always starts out false.
    async fn create_notification(&self, notification: NewNotification) -> Result<Notification>;

    /// Most recent notifications first.
    async fn get_notifications(&self, limit: usize) -> Result<Vec<Notification>>;

    async fn count_notifications(&self) -> Result<usize>;
}

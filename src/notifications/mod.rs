//! Staff-facing notifications written by agents.

mod models;
mod store;

pub use models::{NewNotification, Notification, NotificationType};
pub use store::NotificationStore;

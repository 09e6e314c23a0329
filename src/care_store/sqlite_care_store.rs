use super::models::{
    ActivityLogEntry, FamilyMessage, InventoryItem, LogType, OpenAttendance,
    ResidentLatestMessage, TaskStatus,
};
use super::schema::CARE_VERSIONED_SCHEMAS;
use super::CareStore;
use crate::notifications::{NewNotification, Notification, NotificationStore, NotificationType};
use crate::sqlite_persistence::{open_versioned_db, parse_text_column};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// SQLite backed care database.
///
/// Async trait methods run their queries on the blocking thread pool. The
/// inherent `insert_*` helpers are synchronous and meant for seeding data.
#[derive(Clone)]
pub struct SqliteCareStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCareStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned_db(db_path.as_ref(), CARE_VERSIONED_SCHEMAS, "care")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&guard)
        })
        .await
        .context("Care store query task failed")?
    }

    pub fn insert_resident(&self, name: &str, room: Option<&str>) -> Result<i64> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO residents (name, room) VALUES (?1, ?2)",
            params![name, room],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_staff(&self, name: &str, role: &str) -> Result<i64> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO staff (name, role) VALUES (?1, ?2)",
            params![name, role],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_inventory_item(
        &self,
        name: &str,
        stock: i64,
        min_stock: i64,
        unit: &str,
    ) -> Result<i64> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO inventory_items (name, stock, min_stock, unit) VALUES (?1, ?2, ?3, ?4)",
            params![name, stock, min_stock, unit],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_activity_log(
        &self,
        resident_id: i64,
        author_id: Option<i64>,
        log_type: LogType,
        details: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<i64> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO activity_logs (resident_id, author_id, log_type, details, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                resident_id,
                author_id,
                log_type.as_str(),
                details,
                created_at.timestamp()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_task(
        &self,
        title: &str,
        status: TaskStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<i64> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO tasks (title, status, updated_at) VALUES (?1, ?2, ?3)",
            params![title, status.as_str(), updated_at.timestamp()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_attendance(
        &self,
        staff_id: i64,
        check_in: DateTime<Utc>,
        check_out: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Result<i64> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO attendance (staff_id, check_in, check_out, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                staff_id,
                check_in.timestamp(),
                check_out.map(|t| t.timestamp()),
                created_at.timestamp()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_family_message(
        &self,
        resident_id: i64,
        author_name: &str,
        content: &str,
        from_family: bool,
        created_at: DateTime<Utc>,
    ) -> Result<i64> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO family_messages (resident_id, author_name, content, from_family, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                resident_id,
                author_name,
                content,
                from_family,
                created_at.timestamp()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn row_to_notification(row: &rusqlite::Row) -> rusqlite::Result<Notification> {
        Ok(Notification {
            id: row.get("id")?,
            title: row.get("title")?,
            message: row.get("message")?,
            notification_type: parse_text_column(
                row,
                "notification_type",
                NotificationType::parse,
            )?,
            read: row.get("is_read")?,
            created_at: row.get("created_at")?,
        })
    }
}

fn count(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<usize> {
    let n: i64 = conn.query_row(sql, params, |row| row.get(0))?;
    Ok(n as usize)
}

#[async_trait]
impl CareStore for SqliteCareStore {
    async fn get_inventory_items(&self) -> Result<Vec<InventoryItem>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, stock, min_stock, unit FROM inventory_items ORDER BY name",
            )?;
            let items = stmt
                .query_map([], |row| {
                    Ok(InventoryItem {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        stock: row.get(2)?,
                        min_stock: row.get(3)?,
                        unit: row.get(4)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(items)
        })
        .await
    }

    async fn get_activity_logs_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ActivityLogEntry>> {
        let (start, end) = (start.timestamp(), end.timestamp());
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT l.id, l.resident_id, r.name, s.name, l.log_type, l.details, l.created_at
                 FROM activity_logs l
                 JOIN residents r ON r.id = l.resident_id
                 LEFT JOIN staff s ON s.id = l.author_id
                 WHERE l.created_at >= ?1 AND l.created_at < ?2
                 ORDER BY l.created_at, l.id",
            )?;
            let rows = stmt
                .query_map(params![start, end], |row| {
                    let log_type: String = row.get(4)?;
                    Ok((
                        ActivityLogEntry {
                            id: row.get(0)?,
                            resident_id: row.get(1)?,
                            resident_name: row.get(2)?,
                            author_name: row.get(3)?,
                            log_type: LogType::Note,
                            details: row.get(5)?,
                            created_at: row.get(6)?,
                        },
                        log_type,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.into_iter()
                .map(|(mut entry, log_type)| {
                    entry.log_type = LogType::parse(&log_type).with_context(|| {
                        format!("Unknown log type '{}' on entry {}", log_type, entry.id)
                    })?;
                    Ok(entry)
                })
                .collect::<Result<Vec<_>>>()
        })
        .await
    }

    async fn count_completed_tasks_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<usize> {
        let (start, end) = (start.timestamp(), end.timestamp());
        self.with_conn(move |conn| {
            count(
                conn,
                "SELECT COUNT(*) FROM tasks
                 WHERE status = ?1 AND updated_at >= ?2 AND updated_at < ?3",
                params![TaskStatus::Completed.as_str(), start, end],
            )
        })
        .await
    }

    async fn count_pending_tasks(&self) -> Result<usize> {
        self.with_conn(|conn| {
            count(
                conn,
                "SELECT COUNT(*) FROM tasks WHERE status = ?1",
                params![TaskStatus::Pending.as_str()],
            )
        })
        .await
    }

    async fn count_residents(&self) -> Result<usize> {
        self.with_conn(|conn| count(conn, "SELECT COUNT(*) FROM residents", params![]))
            .await
    }

    async fn get_open_attendance_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<OpenAttendance>> {
        let (start, end) = (start.timestamp(), end.timestamp());
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT a.id, a.staff_id, s.name, a.check_in, a.created_at
                 FROM attendance a
                 JOIN staff s ON s.id = a.staff_id
                 WHERE a.check_out IS NULL AND a.created_at >= ?1 AND a.created_at < ?2
                 ORDER BY a.check_in, a.id",
            )?;
            let rows = stmt
                .query_map(params![start, end], |row| {
                    Ok(OpenAttendance {
                        id: row.get(0)?,
                        staff_id: row.get(1)?,
                        staff_name: row.get(2)?,
                        check_in: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await
    }

    async fn get_residents_with_latest_family_message(&self) -> Result<Vec<ResidentLatestMessage>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.name, m.id, m.author_name, m.content, m.from_family, m.created_at
                 FROM residents r
                 JOIN family_messages m ON m.id = (
                     SELECT m2.id FROM family_messages m2
                     WHERE m2.resident_id = r.id
                     ORDER BY m2.created_at DESC, m2.id DESC
                     LIMIT 1
                 )
                 ORDER BY r.name, r.id",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(ResidentLatestMessage {
                        resident_id: row.get(0)?,
                        resident_name: row.get(1)?,
                        latest_message: FamilyMessage {
                            id: row.get(2)?,
                            author_name: row.get(3)?,
                            content: row.get(4)?,
                            from_family: row.get(5)?,
                            created_at: row.get(6)?,
                        },
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await
    }
}

#[async_trait]
impl NotificationStore for SqliteCareStore {
    async fn create_notification(&self, notification: NewNotification) -> Result<Notification> {
        self.with_conn(move |conn| {
            let created_at = Utc::now().timestamp();
            conn.execute(
                "INSERT INTO notifications (title, message, notification_type, is_read, created_at)
                 VALUES (?1, ?2, ?3, 0, ?4)",
                params![
                    notification.title,
                    notification.message,
                    notification.notification_type.as_str(),
                    created_at
                ],
            )?;
            Ok(Notification {
                id: conn.last_insert_rowid(),
                title: notification.title,
                message: notification.message,
                notification_type: notification.notification_type,
                read: false,
                created_at,
            })
        })
        .await
    }

    async fn get_notifications(&self, limit: usize) -> Result<Vec<Notification>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, message, notification_type, is_read, created_at
                 FROM notifications ORDER BY created_at DESC, id DESC LIMIT ?1",
            )?;
            let rows = stmt
                .query_map(params![limit as i64], Self::row_to_notification)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await
    }

    async fn count_notifications(&self) -> Result<usize> {
        self.with_conn(|conn| count(conn, "SELECT COUNT(*) FROM notifications", params![]))
            .await
    }
}

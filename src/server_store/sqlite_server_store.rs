use super::models::{AgentRun, AgentRunStatus};
use super::schema::SERVER_VERSIONED_SCHEMAS;
use super::ServerStore;
use crate::sqlite_persistence::{
    open_versioned_db, parse_optional_text_column, parse_text_column,
};
use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const RUN_COLUMNS: &str =
    "id, agent_id, run_id, started_at, finished_at, status, message, triggered_by";

pub struct SqliteServerStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteServerStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned_db(db_path.as_ref(), SERVER_VERSIONED_SCHEMAS, "server")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fixed-width so that string order matches time order.
    fn format_datetime(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }

    fn row_to_agent_run(row: &rusqlite::Row) -> rusqlite::Result<AgentRun> {
        Ok(AgentRun {
            id: row.get("id")?,
            agent_id: row.get("agent_id")?,
            run_id: row.get("run_id")?,
            started_at: parse_text_column(row, "started_at", Self::parse_datetime)?,
            finished_at: parse_optional_text_column(row, "finished_at", Self::parse_datetime)?,
            status: parse_text_column(row, "status", AgentRunStatus::parse)?,
            message: row.get("message")?,
            triggered_by: row.get("triggered_by")?,
        })
    }
}

impl ServerStore for SqliteServerStore {
    fn record_run_start(&self, agent_id: &str, run_id: &str, triggered_by: &str) -> Result<i64> {
        let conn = self.lock();
        let now = Self::format_datetime(&Utc::now());

        conn.execute(
            "INSERT INTO agent_runs (agent_id, run_id, started_at, status, triggered_by)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                agent_id,
                run_id,
                now,
                AgentRunStatus::Running.as_str(),
                triggered_by
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn record_run_finish(
        &self,
        row_id: i64,
        status: AgentRunStatus,
        message: Option<String>,
    ) -> Result<()> {
        let conn = self.lock();
        let now = Self::format_datetime(&Utc::now());

        conn.execute(
            "UPDATE agent_runs SET finished_at = ?1, status = ?2, message = ?3 WHERE id = ?4",
            params![now, status.as_str(), message, row_id],
        )?;

        Ok(())
    }

    fn get_run_history(&self, agent_id: &str, limit: usize) -> Result<Vec<AgentRun>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM agent_runs WHERE agent_id = ?1
             ORDER BY started_at DESC, id DESC LIMIT ?2",
            RUN_COLUMNS
        ))?;

        let runs = stmt
            .query_map(params![agent_id, limit as i64], Self::row_to_agent_run)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(runs)
    }

    fn get_last_run(&self, agent_id: &str) -> Result<Option<AgentRun>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM agent_runs WHERE agent_id = ?1
             ORDER BY started_at DESC, id DESC LIMIT 1",
            RUN_COLUMNS
        ))?;

        let run = stmt
            .query_row(params![agent_id], Self::row_to_agent_run)
            .optional()?;

        Ok(run)
    }

    fn mark_stale_runs_failed(&self) -> Result<usize> {
        let conn = self.lock();
        let now = Self::format_datetime(&Utc::now());

        let count = conn.execute(
            "UPDATE agent_runs SET status = ?1, finished_at = ?2, message = ?3
             WHERE status = ?4",
            params![
                AgentRunStatus::Failed.as_str(),
                now,
                "Run was interrupted (server restart)",
                AgentRunStatus::Running.as_str()
            ],
        )?;

        Ok(count)
    }
}

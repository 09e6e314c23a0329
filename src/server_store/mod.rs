mod models;
mod schema;
mod sqlite_server_store;

pub use models::*;
pub use schema::SERVER_VERSIONED_SCHEMAS;
pub use sqlite_server_store::SqliteServerStore;

use anyhow::Result;

/// Bookkeeping for agent executions, kept apart from the care data.
pub trait ServerStore: Send + Sync {
    fn record_run_start(&self, agent_id: &str, run_id: &str, triggered_by: &str) -> Result<i64>;
    fn record_run_finish(
        &self,
        row_id: i64,
        status: AgentRunStatus,
        message: Option<String>,
    ) -> Result<()>;
    fn get_run_history(&self, agent_id: &str, limit: usize) -> Result<Vec<AgentRun>>;
    fn get_last_run(&self, agent_id: &str) -> Result<Option<AgentRun>>;
    /// Marks every run still flagged as running as failed. Called at startup,
    /// when no run can legitimately be in flight.
    fn mark_stale_runs_failed(&self) -> Result<usize>;
}

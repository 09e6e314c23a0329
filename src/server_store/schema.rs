//! Schema of the server database, which holds agent run history.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

const AGENT_RUNS_TABLE_V1: Table = Table {
    name: "agent_runs",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("agent_id", &SqlType::Text, non_null = true),
        sqlite_column!("run_id", &SqlType::Text, non_null = true),
        sqlite_column!("started_at", &SqlType::Text, non_null = true),
        sqlite_column!("finished_at", &SqlType::Text),
        sqlite_column!("status", &SqlType::Text, non_null = true),
        sqlite_column!("message", &SqlType::Text),
        sqlite_column!("triggered_by", &SqlType::Text, non_null = true),
    ],
    indices: &[
        ("idx_agent_runs_agent_started", "agent_id, started_at DESC"),
        ("idx_agent_runs_status", "status"),
    ],
};

pub static SERVER_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[AGENT_RUNS_TABLE_V1],
    migration: None,
}];

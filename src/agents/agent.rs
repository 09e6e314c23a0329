use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by agents and by the runner itself.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent '{0}' not found")]
    NotFound(String),

    #[error("Agent '{0}' is already running")]
    AlreadyRunning(String),

    #[error("{0}")]
    ExecutionFailed(String),

    #[error("Store error: {0:#}")]
    Store(#[from] anyhow::Error),

    #[error("Agent panicked: {0}")]
    Panicked(String),
}

/// Per-invocation values handed to an agent.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one agent run, returned verbatim to HTTP callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

impl AgentResult {
    pub fn ok(message: impl Into<String>, data: JsonValue) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }

    /// Failure result carrying the error text and its raw form under `data`.
    pub fn from_error(error: &AgentError) -> Self {
        let text = error.to_string();
        Self {
            success: false,
            message: Some(text.clone()),
            data: Some(json!({
                "error": text,
                "details": format!("{:?}", error),
            })),
        }
    }
}

/// An automation job that reads facility state and reports on it.
///
/// Implementations keep no state between runs besides injected store handles.
/// They may fail or even panic; the registry turns both into failed results.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Stable unique identifier, used as the trigger key.
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    /// Informational only. Nothing in this process schedules runs.
    fn schedule_description(&self) -> Option<&'static str> {
        None
    }

    async fn run(&self, ctx: &RunContext) -> Result<AgentResult, AgentError>;
}

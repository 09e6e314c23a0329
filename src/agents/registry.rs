use super::agent::{Agent, AgentError, AgentResult, RunContext};
use crate::server::metrics;
use crate::server_store::{AgentRunStatus, ServerStore};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::task::JoinError;
use tracing::{error, info, warn};

/// How a run was requested. Stored with the run history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Manual,
    Cron,
    Api,
}

impl TriggerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerSource::Manual => "manual",
            TriggerSource::Cron => "cron",
            TriggerSource::Api => "api",
        }
    }
}

type RunningFlags = Arc<Mutex<HashMap<String, bool>>>;

/// Holds an agent's running flag and clears it when dropped.
///
/// The guard lives inside the task executing the agent, so the flag is
/// released once the agent finishes no matter how, even if whoever
/// requested the run has stopped waiting.
struct RunningGuard {
    running: RunningFlags,
    agent_id: String,
}

impl RunningGuard {
    /// Check-and-set under a single lock acquisition.
    fn try_acquire(running: &RunningFlags, agent_id: &str) -> Option<Self> {
        let mut flags = running.lock().unwrap_or_else(PoisonError::into_inner);
        let flag = flags.entry(agent_id.to_string()).or_insert(false);
        if *flag {
            return None;
        }
        *flag = true;
        metrics::set_agent_running(agent_id, true);
        Some(Self {
            running: Arc::clone(running),
            agent_id: agent_id.to_string(),
        })
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        let mut flags = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        flags.insert(self.agent_id.clone(), false);
        metrics::set_agent_running(&self.agent_id, false);
    }
}

/// Process-wide table of agents plus the guarded execution engine.
///
/// Built once at startup and shared as `Arc<AgentRegistry>`.
pub struct AgentRegistry {
    agents: HashMap<String, Arc<dyn Agent>>,
    running: RunningFlags,
    server_store: Option<Arc<dyn ServerStore>>,
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            agents: HashMap::new(),
            running: Arc::new(Mutex::new(HashMap::new())),
            server_store: None,
        }
    }

    /// Registry that also records every run in `server_store`.
    pub fn with_server_store(server_store: Arc<dyn ServerStore>) -> Self {
        Self {
            server_store: Some(server_store),
            ..Self::new()
        }
    }

    /// Registers an agent. An agent with the same id is replaced.
    pub fn register(&mut self, agent: Arc<dyn Agent>) {
        let id = agent.id().to_string();
        if self.agents.contains_key(&id) {
            warn!("Agent '{}' registered twice, replacing previous entry", id);
        }
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), false);
        info!("Registered agent: {} ({})", id, agent.name());
        self.agents.insert(id, agent);
    }

    pub fn get(&self, agent_id: &str) -> Option<Arc<dyn Agent>> {
        self.agents.get(agent_id).cloned()
    }

    /// All registered agents, sorted by id.
    pub fn get_all(&self) -> Vec<Arc<dyn Agent>> {
        let mut agents: Vec<_> = self.agents.values().cloned().collect();
        agents.sort_by(|a, b| a.id().cmp(b.id()));
        agents
    }

    /// Sorted ids of all registered agents.
    pub fn agent_ids(&self) -> Vec<String> {
        self.get_all()
            .iter()
            .map(|agent| agent.id().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn is_running(&self, agent_id: &str) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(agent_id)
            .copied()
            .unwrap_or(false)
    }

    pub async fn run(&self, agent_id: &str) -> AgentResult {
        self.run_with_trigger(agent_id, TriggerSource::Manual).await
    }

    /// Runs an agent and converts every outcome into an `AgentResult`.
    ///
    /// Never returns an error and never propagates a panic from the agent.
    pub async fn run_with_trigger(&self, agent_id: &str, trigger: TriggerSource) -> AgentResult {
        let Some(agent) = self.get(agent_id) else {
            warn!("Requested unknown agent: {}", agent_id);
            return AgentResult::from_error(&AgentError::NotFound(agent_id.to_string()));
        };

        let Some(guard) = RunningGuard::try_acquire(&self.running, agent_id) else {
            info!("Agent {} is already running, rejecting run", agent_id);
            return AgentResult::from_error(&AgentError::AlreadyRunning(agent_id.to_string()));
        };

        let ctx = RunContext::new();
        let server_store = self.server_store.clone();
        let history_row = server_store.as_ref().and_then(|store| {
            match store.record_run_start(agent_id, &ctx.run_id, trigger.as_str()) {
                Ok(row) => Some(row),
                Err(e) => {
                    error!("Failed to record run start for {}: {:#}", agent_id, e);
                    None
                }
            }
        });

        info!(
            "Starting agent: {} (run_id: {}, triggered_by: {})",
            agent_id,
            ctx.run_id,
            trigger.as_str()
        );

        let agent_id_owned = agent_id.to_string();
        let run_id = ctx.run_id.clone();

        let supervisor = tokio::spawn(async move {
            let _guard = guard;
            let start_time = Instant::now();

            // The agent gets its own task so that a panic surfaces as a JoinError.
            let outcome = tokio::spawn(async move { agent.run(&ctx).await }).await;
            let elapsed = start_time.elapsed();

            let result = match outcome {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => {
                    error!("Agent {} failed after {:?}: {}", agent_id_owned, elapsed, e);
                    AgentResult::from_error(&e)
                }
                Err(join_error) => {
                    let e = AgentError::Panicked(join_error_message(join_error));
                    error!("Agent {} {} after {:?}", agent_id_owned, e, elapsed);
                    AgentResult::from_error(&e)
                }
            };

            let (status, status_label) = if result.success {
                info!("Agent {} completed in {:?}", agent_id_owned, elapsed);
                (AgentRunStatus::Completed, "success")
            } else {
                (AgentRunStatus::Failed, "failure")
            };
            metrics::record_agent_run(&agent_id_owned, status_label, elapsed);

            if let (Some(store), Some(row)) = (server_store, history_row) {
                if let Err(e) = store.record_run_finish(row, status, result.message.clone()) {
                    error!("Failed to record run finish for {}: {:#}", agent_id_owned, e);
                }
            }

            result
        });

        match supervisor.await {
            Ok(result) => result,
            Err(join_error) => {
                let e = AgentError::Panicked(join_error_message(join_error));
                error!("Supervisor for agent {} (run_id: {}) died: {}", agent_id, run_id, e);
                AgentResult::from_error(&e)
            }
        }
    }
}

fn join_error_message(join_error: JoinError) -> String {
    if join_error.is_panic() {
        panic_payload_message(join_error.into_panic())
    } else {
        join_error.to_string()
    }
}

fn panic_payload_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

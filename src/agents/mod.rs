//! Pluggable audit agents and the runner that executes them.

mod agent;
pub mod jobs;
mod registry;

pub use agent::{Agent, AgentError, AgentResult, RunContext};
pub use jobs::builtin_agents;
pub use registry::{AgentRegistry, TriggerSource};

//! Care facility automation agents
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod agents;
pub mod care_store;
pub mod config;
pub mod notifications;
pub mod server;
pub mod server_store;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use agents::{builtin_agents, Agent, AgentRegistry, AgentResult, TriggerSource};
pub use care_store::{CareStore, FullCareStore, SqliteCareStore};
pub use notifications::NotificationStore;
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig, ServerState};
pub use server_store::{ServerStore, SqliteServerStore};

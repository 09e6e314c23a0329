use axum::extract::FromRef;

use crate::agents::AgentRegistry;
use crate::care_store::FullCareStore;
use crate::server_store::ServerStore;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedAgentRegistry = Arc<AgentRegistry>;
pub type GuardedCareStore = Arc<dyn FullCareStore>;
pub type GuardedServerStore = Arc<dyn ServerStore>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub registry: GuardedAgentRegistry,
    pub care_store: GuardedCareStore,
    pub server_store: GuardedServerStore,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        registry: GuardedAgentRegistry,
        care_store: GuardedCareStore,
        server_store: GuardedServerStore,
    ) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            registry,
            care_store,
            server_store,
        }
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedAgentRegistry {
    fn from_ref(input: &ServerState) -> Self {
        input.registry.clone()
    }
}

impl FromRef<ServerState> for GuardedCareStore {
    fn from_ref(input: &ServerState) -> Self {
        input.care_store.clone()
    }
}

impl FromRef<ServerState> for GuardedServerStore {
    fn from_ref(input: &ServerState) -> Self {
        input.server_store.clone()
    }
}

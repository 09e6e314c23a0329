//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own care and server databases.

use super::constants::*;
use super::fixtures::seed_care_data;
use carehub_agents::care_store::{FullCareStore, SqliteCareStore};
use carehub_agents::server::{make_app, RequestsLoggingLevel, ServerConfig, ServerState};
use carehub_agents::server_store::{ServerStore, SqliteServerStore};
use carehub_agents::{builtin_agents, AgentRegistry};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with isolated databases
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Care store for direct database access in tests
    pub care_store: Arc<SqliteCareStore>,

    /// Run history store for direct database access in tests
    pub server_store: Arc<dyn ServerStore>,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a seeded test server guarded by [`TEST_SECRET`]
    pub async fn spawn() -> Self {
        Self::spawn_with_secret(Some(TEST_SECRET)).await
    }

    /// Spawns a seeded test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if database creation, port binding or server startup fails.
    pub async fn spawn_with_secret(secret: Option<&str>) -> Self {
        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");

        let care_store = Arc::new(
            SqliteCareStore::new(temp_db_dir.path().join("care.db"))
                .expect("Failed to open care store"),
        );
        seed_care_data(&care_store).expect("Failed to seed care data");

        let server_store: Arc<dyn ServerStore> = Arc::new(
            SqliteServerStore::new(temp_db_dir.path().join("server.db"))
                .expect("Failed to open server store"),
        );

        let full_store: Arc<dyn FullCareStore> = care_store.clone();
        let mut registry = AgentRegistry::with_server_store(server_store.clone());
        for agent in builtin_agents(full_store.clone()) {
            registry.register(agent);
        }

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            agents_secret: secret.map(str::to_string),
            ..Default::default()
        };
        let state = ServerState::new(
            config,
            Arc::new(registry),
            full_store,
            server_store.clone(),
        );
        let app = make_app(state);

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            care_store,
            server_store,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

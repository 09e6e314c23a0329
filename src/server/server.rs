use anyhow::{Context, Result};
use axum::{extract::State, middleware, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info};

use super::agent_routes::make_agent_routes;
use super::metrics::{init_metrics, metrics_handler};
use super::{log_requests, ServerConfig, ServerState};
use crate::agents::AgentRegistry;
use crate::care_store::FullCareStore;
use crate::notifications::NotificationStore;
use crate::server_store::ServerStore;
use std::sync::Arc;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerStats {
    pub uptime: String,
    pub agent_count: usize,
    pub running_agents: Vec<String>,
    pub notification_count: Option<usize>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let running_agents = state
        .registry
        .agent_ids()
        .into_iter()
        .filter(|id| state.registry.is_running(id))
        .collect();
    let notification_count = match state.care_store.count_notifications().await {
        Ok(n) => Some(n),
        Err(e) => {
            error!("Failed to count notifications: {:#}", e);
            None
        }
    };

    Json(ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        agent_count: state.registry.len(),
        running_agents,
        notification_count,
    })
}

pub fn make_app(state: ServerState) -> Router {
    Router::new()
        .route("/", get(home))
        .merge(make_agent_routes())
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .with_state(state)
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

pub async fn run_server(
    config: ServerConfig,
    registry: Arc<AgentRegistry>,
    care_store: Arc<dyn FullCareStore>,
    server_store: Arc<dyn ServerStore>,
) -> Result<()> {
    init_metrics();

    let port = config.port;
    let metrics_port = config.metrics_port;
    let state = ServerState::new(config, registry, care_store, server_store);
    let app = make_app(state);

    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(metrics_listener, make_metrics_app()).await {
            error!("Metrics server stopped: {}", e);
        }
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    info!("Ready to serve at port {}!", port);
    info!("Metrics available at port {}!", metrics_port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::care_store::SqliteCareStore;
    use crate::notifications::{NewNotification, NotificationStore};
    use crate::server_store::SqliteServerStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt; // for `oneshot`

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0d 00:00:00");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1d 01:01:01");
    }

    #[tokio::test]
    async fn home_reports_stats() {
        let temp_dir = TempDir::new().unwrap();
        let care_store = Arc::new(SqliteCareStore::new(temp_dir.path().join("care.db")).unwrap());
        care_store
            .create_notification(NewNotification::info("t", "m"))
            .await
            .unwrap();
        let server_store =
            Arc::new(SqliteServerStore::new(temp_dir.path().join("server.db")).unwrap());
        let mut registry = AgentRegistry::new();
        for agent in crate::agents::builtin_agents(care_store.clone()) {
            registry.register(agent);
        }

        let state = ServerState::new(
            ServerConfig::default(),
            Arc::new(registry),
            care_store,
            server_store,
        );
        let response = make_app(state)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["agentCount"], 4);
        assert_eq!(body["notificationCount"], 1);
        assert_eq!(body["runningAgents"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn metrics_app_serves_metrics() {
        init_metrics();
        let response = make_metrics_app()
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

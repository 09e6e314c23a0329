//! Trigger surface: list agents, run them and inspect their history.

use super::state::{GuardedAgentRegistry, GuardedServerStore, ServerState};
use super::ServerConfig;
use crate::agents::{AgentResult, TriggerSource};
use crate::server_store::AgentRun;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{error, warn};

/// Upper bound on the history page size a caller may request.
const MAX_HISTORY_LIMIT: usize = 500;

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("Missing agent id")]
    MissingAgent { available_agents: Vec<String> },

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Unauthorized")]
    Unauthorized,
}

impl IntoResponse for TriggerError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            TriggerError::MissingAgent { available_agents } => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": message,
                    "availableAgents": available_agents,
                })),
            )
                .into_response(),
            TriggerError::InvalidBody(_) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            TriggerError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
            }
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AgentInfo {
    id: &'static str,
    name: &'static str,
    schedule_description: Option<&'static str>,
    is_running: bool,
    last_run: Option<AgentRun>,
}

#[derive(Serialize)]
struct AgentList {
    agents: Vec<AgentInfo>,
}

#[derive(Deserialize, Debug)]
struct RunQuery {
    agent: Option<String>,
    secret: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RunBody {
    agent_id: Option<String>,
}

#[derive(Deserialize, Debug)]
struct HistoryQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AgentHistory {
    agent_id: String,
    runs: Vec<AgentRun>,
}

/// Token after `Bearer `, byte for byte. Not trimmed, like the query secret.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

fn secret_matches(expected: &str, given: &str) -> bool {
    let expected_bytes = expected.as_bytes();
    let given_bytes = given.as_bytes();
    if expected_bytes.len() != given_bytes.len() {
        return false;
    }
    expected_bytes.ct_eq(given_bytes).into()
}

/// Passes when no secret is configured or one of the candidates matches it.
///
/// Every candidate is compared in constant time, even after a match.
fn check_secret(config: &ServerConfig, candidates: &[Option<&str>]) -> Result<(), TriggerError> {
    let Some(expected) = config.agents_secret.as_deref() else {
        return Ok(());
    };
    let matched = candidates
        .iter()
        .flatten()
        .fold(false, |acc, given| secret_matches(expected, given) | acc);
    if matched {
        Ok(())
    } else {
        warn!("Rejected agent trigger with missing or wrong secret");
        Err(TriggerError::Unauthorized)
    }
}

fn require_agent_id(
    agent_id: Option<String>,
    registry: &GuardedAgentRegistry,
) -> Result<String, TriggerError> {
    match agent_id.map(|id| id.trim().to_string()) {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(TriggerError::MissingAgent {
            available_agents: registry.agent_ids(),
        }),
    }
}

fn result_response(result: AgentResult) -> Response {
    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(result)).into_response()
}

async fn list_agents(
    State(registry): State<GuardedAgentRegistry>,
    State(server_store): State<GuardedServerStore>,
) -> Json<AgentList> {
    let agents = registry
        .get_all()
        .into_iter()
        .map(|agent| {
            let last_run = server_store.get_last_run(agent.id()).unwrap_or_else(|e| {
                error!("Failed to read last run of {}: {:#}", agent.id(), e);
                None
            });
            AgentInfo {
                id: agent.id(),
                name: agent.name(),
                schedule_description: agent.schedule_description(),
                is_running: registry.is_running(agent.id()),
                last_run,
            }
        })
        .collect();
    Json(AgentList { agents })
}

async fn run_agent_get(
    State(config): State<ServerConfig>,
    State(registry): State<GuardedAgentRegistry>,
    headers: HeaderMap,
    Query(query): Query<RunQuery>,
) -> Result<Response, TriggerError> {
    check_secret(&config, &[query.secret.as_deref(), bearer_token(&headers)])?;
    let agent_id = require_agent_id(query.agent, &registry)?;
    let result = registry
        .run_with_trigger(&agent_id, TriggerSource::Cron)
        .await;
    Ok(result_response(result))
}

async fn run_agent_post(
    State(config): State<ServerConfig>,
    State(registry): State<GuardedAgentRegistry>,
    headers: HeaderMap,
    body: Result<Json<RunBody>, JsonRejection>,
) -> Result<Response, TriggerError> {
    check_secret(&config, &[bearer_token(&headers)])?;
    let Json(body) = body.map_err(|rejection| TriggerError::InvalidBody(rejection.body_text()))?;
    let agent_id = require_agent_id(body.agent_id, &registry)?;
    let result = registry.run_with_trigger(&agent_id, TriggerSource::Api).await;
    Ok(result_response(result))
}

async fn get_agent_history(
    State(config): State<ServerConfig>,
    State(registry): State<GuardedAgentRegistry>,
    State(server_store): State<GuardedServerStore>,
    Path(agent_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    if registry.get(&agent_id).is_none() {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Agent '{}' not found", agent_id) })),
        )
            .into_response();
    }

    let limit = query
        .limit
        .unwrap_or(config.history_limit)
        .clamp(1, MAX_HISTORY_LIMIT);
    match server_store.get_run_history(&agent_id, limit) {
        Ok(runs) => Json(AgentHistory { agent_id, runs }).into_response(),
        Err(e) => {
            error!("Failed to read run history of {}: {:#}", agent_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to read run history" })),
            )
                .into_response()
        }
    }
}

pub fn make_agent_routes() -> Router<ServerState> {
    Router::new()
        .route("/agents", get(list_agents))
        .route("/agents/run", get(run_agent_get).post(run_agent_post))
        .route("/agents/{id}/history", get(get_agent_history))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{Agent, AgentError, AgentRegistry, RunContext};
    use crate::care_store::SqliteCareStore;
    use crate::server_store::SqliteServerStore;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt; // for `oneshot`

    struct EchoAgent {
        id: &'static str,
        succeed: bool,
    }

    #[async_trait]
    impl Agent for EchoAgent {
        fn id(&self) -> &'static str {
            self.id
        }

        fn name(&self) -> &'static str {
            "Echo"
        }

        fn schedule_description(&self) -> Option<&'static str> {
            Some("Never")
        }

        async fn run(&self, ctx: &RunContext) -> Result<AgentResult, AgentError> {
            if self.succeed {
                Ok(AgentResult::ok("echoed", json!({ "runId": ctx.run_id })))
            } else {
                Err(AgentError::ExecutionFailed("echo failed".to_string()))
            }
        }
    }

    fn make_test_app(secret: Option<&str>) -> (Router, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let care_store = Arc::new(SqliteCareStore::new(temp_dir.path().join("care.db")).unwrap());
        let server_store: GuardedServerStore =
            Arc::new(SqliteServerStore::new(temp_dir.path().join("server.db")).unwrap());

        let mut registry = AgentRegistry::with_server_store(server_store.clone());
        registry.register(Arc::new(EchoAgent {
            id: "echo",
            succeed: true,
        }));
        registry.register(Arc::new(EchoAgent {
            id: "broken",
            succeed: false,
        }));

        let config = ServerConfig {
            agents_secret: secret.map(str::to_string),
            ..Default::default()
        };
        let state = ServerState::new(config, Arc::new(registry), care_store, server_store);
        let app = make_agent_routes().with_state(state);
        (app, temp_dir)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_request(body: &str, bearer: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/agents/run")
            .header("content-type", "application/json");
        if let Some(token) = bearer {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn lists_agents_sorted_by_id() {
        let (app, _temp_dir) = make_test_app(None);

        let (status, body) = send(app, get_request("/agents")).await;

        assert_eq!(status, StatusCode::OK);
        let agents = body["agents"].as_array().unwrap();
        assert_eq!(agents.len(), 2);
        assert_eq!(agents[0]["id"], "broken");
        assert_eq!(agents[1]["id"], "echo");
        assert_eq!(agents[1]["scheduleDescription"], "Never");
        assert_eq!(agents[1]["isRunning"], false);
    }

    #[tokio::test]
    async fn get_run_succeeds_with_200() {
        let (app, _temp_dir) = make_test_app(None);

        let (status, body) = send(app, get_request("/agents/run?agent=echo")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "echoed");
    }

    #[tokio::test]
    async fn get_run_failure_is_500_with_result_body() {
        let (app, _temp_dir) = make_test_app(None);

        let (status, body) = send(app, get_request("/agents/run?agent=broken")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "echo failed");
        assert_eq!(body["data"]["error"], "echo failed");
    }

    #[tokio::test]
    async fn get_run_unknown_agent_is_500_not_found() {
        let (app, _temp_dir) = make_test_app(None);

        let (status, body) = send(app, get_request("/agents/run?agent=ghost")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Agent 'ghost' not found");
    }

    #[tokio::test]
    async fn get_run_without_agent_lists_available_agents() {
        let (app, _temp_dir) = make_test_app(None);

        let (status, body) = send(app, get_request("/agents/run")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["availableAgents"], json!(["broken", "echo"]));
    }

    #[tokio::test]
    async fn get_run_checks_secret_from_query_or_header() {
        let (app, _temp_dir) = make_test_app(Some("hunter2"));

        let (status, _) = send(app.clone(), get_request("/agents/run?agent=echo")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            app.clone(),
            get_request("/agents/run?agent=echo&secret=wrong"),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            app.clone(),
            get_request("/agents/run?agent=echo&secret=hunter2"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let request = Request::builder()
            .uri("/agents/run?agent=echo")
            .header("authorization", "Bearer hunter2")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn secret_comparison_is_exact() {
        assert!(secret_matches("hunter2", "hunter2"));
        assert!(!secret_matches("hunter2", "hunter"));
        assert!(!secret_matches("hunter2", "hunter3"));
        assert!(!secret_matches("hunter2", "hunter2 "));
        assert!(!secret_matches("hunter2", ""));
    }

    #[test]
    fn check_secret_accepts_any_matching_candidate() {
        let config = ServerConfig {
            agents_secret: Some("hunter2".to_string()),
            ..Default::default()
        };
        assert!(check_secret(&config, &[Some("wrong"), Some("hunter2")]).is_ok());
        assert!(check_secret(&config, &[None, Some("hunter2")]).is_ok());
        assert!(matches!(
            check_secret(&config, &[None, Some("wrong")]),
            Err(TriggerError::Unauthorized)
        ));

        let open = ServerConfig::default();
        assert!(check_secret(&open, &[None]).is_ok());
    }

    #[tokio::test]
    async fn bearer_secret_keeps_surrounding_whitespace() {
        let (app, _temp_dir) = make_test_app(Some("padded "));

        let (status, _) = send(
            app.clone(),
            post_request(r#"{"agentId":"echo"}"#, Some("padded ")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(app, post_request(r#"{"agentId":"echo"}"#, Some("padded"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unauthorized_is_checked_before_missing_agent() {
        let (app, _temp_dir) = make_test_app(Some("hunter2"));

        let (status, _) = send(app, get_request("/agents/run")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn post_run_uses_json_body() {
        let (app, _temp_dir) = make_test_app(None);

        let (status, body) = send(app, post_request(r#"{"agentId":"echo"}"#, None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn post_run_rejects_blank_and_malformed_bodies() {
        let (app, _temp_dir) = make_test_app(None);

        let (status, body) = send(app.clone(), post_request(r#"{"agentId":"  "}"#, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["availableAgents"], json!(["broken", "echo"]));

        let (status, _) = send(app.clone(), post_request(r#"{}"#, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(app, post_request("{not json", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn post_run_requires_bearer_secret() {
        let (app, _temp_dir) = make_test_app(Some("hunter2"));

        let (status, _) = send(app.clone(), post_request(r#"{"agentId":"echo"}"#, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            app,
            post_request(r#"{"agentId":"echo"}"#, Some("hunter2")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn history_lists_recorded_runs() {
        let (app, _temp_dir) = make_test_app(None);

        send(app.clone(), get_request("/agents/run?agent=echo")).await;
        send(app.clone(), post_request(r#"{"agentId":"echo"}"#, None)).await;

        let (status, body) = send(app.clone(), get_request("/agents/echo/history")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["agentId"], "echo");
        let runs = body["runs"].as_array().unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0]["triggeredBy"], "api");
        assert_eq!(runs[1]["triggeredBy"], "cron");
        assert_eq!(runs[0]["status"], "completed");

        let (_, body) = send(app, get_request("/agents/echo/history?limit=1")).await;
        assert_eq!(body["runs"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn history_of_unknown_agent_is_404() {
        let (app, _temp_dir) = make_test_app(None);

        let (status, _) = send(app, get_request("/agents/ghost/history")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per agents endpoint.
//! When routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::json;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    /// Secret sent with trigger requests, if any
    pub secret: Option<String>,
}

impl TestClient {
    /// Creates a client that sends no secret
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            secret: None,
        }
    }

    /// Creates a client that authenticates with [`TEST_SECRET`]
    pub fn with_secret(base_url: String) -> Self {
        let mut client = Self::new(base_url);
        client.secret = Some(TEST_SECRET.to_string());
        client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_bearer(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.secret {
            Some(secret) => request.bearer_auth(secret),
            None => request,
        }
    }

    // ========================================================================
    // Server
    // ========================================================================

    /// GET /
    pub async fn get_home(&self) -> Response {
        self.client
            .get(self.url("/"))
            .send()
            .await
            .expect("Home request failed")
    }

    // ========================================================================
    // Agents
    // ========================================================================

    /// GET /agents
    pub async fn list_agents(&self) -> Response {
        self.client
            .get(self.url("/agents"))
            .send()
            .await
            .expect("List agents request failed")
    }

    /// GET /agents/run?agent=<id>&secret=<secret>
    pub async fn run_agent_get(&self, agent_id: &str) -> Response {
        let mut query: Vec<(&str, &str)> = vec![("agent", agent_id)];
        if let Some(secret) = &self.secret {
            query.push(("secret", secret.as_str()));
        }
        self.client
            .get(self.url("/agents/run"))
            .query(&query)
            .send()
            .await
            .expect("Run agent request failed")
    }

    /// GET /agents/run with only the secret, no agent
    pub async fn run_agent_get_without_agent(&self) -> Response {
        let mut request = self.client.get(self.url("/agents/run"));
        if let Some(secret) = &self.secret {
            request = request.query(&[("secret", secret)]);
        }
        request.send().await.expect("Run agent request failed")
    }

    /// POST /agents/run with `{ "agentId": <id> }`
    pub async fn run_agent_post(&self, agent_id: &str) -> Response {
        self.with_bearer(self.client.post(self.url("/agents/run")))
            .json(&json!({ "agentId": agent_id }))
            .send()
            .await
            .expect("Run agent request failed")
    }

    /// POST /agents/run with a raw body
    pub async fn run_agent_post_raw(&self, body: &'static str) -> Response {
        self.with_bearer(self.client.post(self.url("/agents/run")))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Run agent request failed")
    }

    /// GET /agents/{id}/history
    pub async fn get_agent_history(&self, agent_id: &str, limit: Option<usize>) -> Response {
        let mut request = self
            .client
            .get(self.url(&format!("/agents/{}/history", agent_id)));
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        request.send().await.expect("History request failed")
    }
}

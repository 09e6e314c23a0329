//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestServer, TestClient, LOW_STOCK_AUDIT};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_run_low_stock_audit() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::with_secret(server.base_url.clone());
//!
//!     let response = client.run_agent_get(LOW_STOCK_AUDIT).await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

mod client;
mod constants;
mod fixtures;
mod server;

// Public API - this is what tests import
pub use client::TestClient;
pub use constants::*;
pub use server::TestServer;

// Keep fixtures internal - only accessed via TestServer::spawn()
#[allow(unused_imports)]
pub(crate) use fixtures::seed_care_data;

use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all metrics exported by this service
const PREFIX: &str = "carehub";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Agent Metrics
    pub static ref AGENT_RUNS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_agent_runs_total"), "Total agent runs by outcome"),
        &["agent", "status"]
    ).expect("Failed to create agent_runs_total metric");

    pub static ref AGENT_RUN_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_agent_run_duration_seconds"),
            "Agent run duration in seconds"
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0, 60.0]),
        &["agent"]
    ).expect("Failed to create agent_run_duration_seconds metric");

    pub static ref AGENT_RUNNING: GaugeVec = GaugeVec::new(
        Opts::new(format!("{PREFIX}_agent_running"), "Whether an agent is currently running (1) or idle (0)"),
        &["agent"]
    ).expect("Failed to create agent_running metric");
}

/// Registers every metric with the global registry.
pub fn init_metrics() {
    // Ignore errors if already registered (tests call this repeatedly)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(AGENT_RUNS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(AGENT_RUN_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(AGENT_RUNNING.clone()));
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record a finished agent run. `status` is "success" or "failure".
pub fn record_agent_run(agent_id: &str, status: &str, duration: Duration) {
    AGENT_RUNS_TOTAL
        .with_label_values(&[agent_id, status])
        .inc();

    AGENT_RUN_DURATION_SECONDS
        .with_label_values(&[agent_id])
        .observe(duration.as_secs_f64());
}

pub fn set_agent_running(agent_id: &str, running: bool) {
    AGENT_RUNNING
        .with_label_values(&[agent_id])
        .set(if running { 1.0 } else { 0.0 });
}

pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}

//! Prometheus metrics
//!
//! Counters and histograms are recorded through the `metrics` facade from
//! every crate; this module installs the exporter and serves `/metrics`.

use axum::extract::{MatchedPath, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;
use crate::ServerError;

/// Install the global Prometheus recorder
///
/// Can only succeed once per process.
pub fn init_metrics() -> Result<PrometheusHandle, ServerError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::Startup(format!("Failed to install metrics recorder: {}", e)))?;

    metrics::describe_counter!("voice_relay_requests_total", "HTTP requests by route and status");
    metrics::describe_counter!(
        "voice_relay_llm_soft_failures_total",
        "Generation calls answered with a sentinel"
    );
    metrics::describe_histogram!("voice_relay_stt_latency_ms", "Transcription latency");
    metrics::describe_histogram!("voice_relay_llm_latency_ms", "Generation latency");
    metrics::describe_histogram!("voice_relay_tts_latency_ms", "Synthesis latency");

    Ok(handle)
}

pub fn record_request(route: &str, status: StatusCode) {
    metrics::counter!(
        "voice_relay_requests_total",
        "route" => route.to_string(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);
}

/// Count every routed request
pub async fn track_requests(req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let response = next.run(req).await;
    record_request(&route, response.status());
    response
}

pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => ServerError::NotFound("Metrics disabled".to_string()).into_response(),
    }
}

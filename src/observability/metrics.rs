//! Metrics collection and exposition.
//!
//! # Metrics
//! - `custom_responses_total` (counter): finished handlers by `outcome`
//! - `custom_response_duration_seconds` (histogram): time from request
//!   arrival to the handler reaching a terminal state, by `outcome`
//! - `custom_response_rejected_total` (counter): requests whose target
//!   could not be resolved

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::handler::RunState;

/// Start the Prometheus scrape endpoint. Needs a running Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_custom_response(state: RunState, start: Instant) {
    let outcome = state.as_str();
    counter!("custom_responses_total", "outcome" => outcome).increment(1);
    histogram!("custom_response_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rejected_target() {
    counter!("custom_response_rejected_total").increment(1);
}

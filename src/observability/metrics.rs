//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Install the process-wide Prometheus recorder at startup
//! - Count and time requests per frontend and per backend
//!
//! # Metrics
//! - `gateway_frontend_requests_total` (counter): requests received, by frontend name
//! - `gateway_frontend_request_duration_seconds` (histogram): time to respond, by frontend name
//! - `gateway_backend_requests_total` (counter): requests handed to a backend, by backend name
//! - `gateway_backend_request_duration_seconds` (histogram): backend latency, by backend name
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - The only label is the frontend/backend name
//! - Recording before the recorder is installed is a no-op

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

pub const FRONTEND_REQUESTS: &str = "gateway_frontend_requests_total";
pub const FRONTEND_DURATION: &str = "gateway_frontend_request_duration_seconds";
pub const BACKEND_REQUESTS: &str = "gateway_backend_requests_total";
pub const BACKEND_DURATION: &str = "gateway_backend_request_duration_seconds";

/// Histogram buckets tuned for typical web latencies (seconds).
const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Install the global recorder and return a handle for rendering.
///
/// Can succeed only once per process.
pub fn install() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )?
        .install_recorder()?;

    describe_counter!(FRONTEND_REQUESTS, "The total number of requests processed by a frontend");
    describe_histogram!(
        FRONTEND_DURATION,
        Unit::Seconds,
        "The duration that requests took to be processed by a frontend"
    );
    describe_counter!(BACKEND_REQUESTS, "The total number of requests processed by a backend");
    describe_histogram!(
        BACKEND_DURATION,
        Unit::Seconds,
        "The duration that requests took to be processed by a backend"
    );

    tracing::info!("Metrics recorder installed");
    Ok(handle)
}

pub fn record_frontend_request(name: &str) {
    counter!(FRONTEND_REQUESTS, "name" => name.to_owned()).increment(1);
}

pub fn record_frontend_duration(name: &str, start: Instant) {
    histogram!(FRONTEND_DURATION, "name" => name.to_owned()).record(start.elapsed().as_secs_f64());
}

pub fn record_backend_request(name: &str) {
    counter!(BACKEND_REQUESTS, "name" => name.to_owned()).increment(1);
}

pub fn record_backend_duration(name: &str, start: Instant) {
    histogram!(BACKEND_DURATION, "name" => name.to_owned()).record(start.elapsed().as_secs_f64());
}

//! Metric recording helpers
//!
//! Label cardinality is bounded: HTTP paths use the matched route template
//! and status codes are bucketed (2xx, 3xx, 4xx, 5xx).

use std::time::Duration;
use metrics::{counter, histogram};

/// Outcome label for search mirror calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorOutcome {
    Success,
    Error,
}

impl MirrorOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            MirrorOutcome::Success => "success",
            MirrorOutcome::Error => "error",
        }
    }
}

/// Bucket HTTP status codes to control cardinality
pub fn bucket_status_code(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

/// HTTP request metrics recording
///
/// Without an installed recorder the `metrics` macros are no-ops.
pub fn record_http_request(method: &str, path: &str, status_code: u16, duration: Duration) {
    let status_bucket = bucket_status_code(status_code);

    counter!(
        "http_request_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_bucket
    ).increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_bucket
    ).record(duration.as_secs_f64());

    tracing::trace!(
        method = %method,
        path = %path,
        status = %status_bucket,
        duration_ms = %duration.as_millis(),
        "HTTP request metrics recorded"
    );
}

/// Search mirror call recording (`save`, `delete`, `search`)
pub fn record_mirror_operation(operation: &'static str, outcome: MirrorOutcome, duration: Duration) {
    counter!(
        "search_mirror_operations_total",
        "operation" => operation,
        "outcome" => outcome.as_str()
    ).increment(1);

    histogram!(
        "search_mirror_operation_duration_seconds",
        "operation" => operation
    ).record(duration.as_secs_f64());
}

/// Record store write recording (`create`, `update`, `delete`)
pub fn record_store_write(operation: &'static str) {
    counter!("comment_store_writes_total", "operation" => operation).increment(1);
}

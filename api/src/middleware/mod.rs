pub mod tracing;

pub use self::tracing::{TRACE_ID_HEADER, TraceId, trace_requests};

use crate::observability::metrics::record_http_request;
use std::time::Instant;
use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};

/// Label used for requests that matched no route
const UNMATCHED_PATH: &str = "unmatched";

/// Middleware to record HTTP request metrics, labelled by route template
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_PATH.to_string());

    let response = next.run(req).await;
    let status = response.status().as_u16();

    record_http_request(&method, &path, status, start.elapsed());

    response
}

//! Request tracing middleware
//!
//! Every request runs inside an `http_request` span carrying a trace id.
//! The id is taken from the `x-trace-id` request header when present and
//! echoed back on the response.

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::{info_span, Instrument};

/// HTTP header name for trace ID
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Longest caller-supplied trace id that is propagated as-is
const MAX_TRACE_ID_LEN: usize = 128;

pub fn generate_trace_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn incoming_trace_id(request: &Request) -> Option<String> {
    request
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty() && s.len() <= MAX_TRACE_ID_LEN)
        .map(str::to_string)
}

/// Request tracing middleware that generates trace IDs and propagates them
/// through the request lifecycle
pub async fn trace_requests(mut request: Request, next: Next) -> Response {
    let trace_id = incoming_trace_id(&request).unwrap_or_else(generate_trace_id);

    let span = info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %request.method(),
        uri = %request.uri(),
        version = ?request.version(),
    );

    request.extensions_mut().insert(TraceId(trace_id.clone()));

    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }

    response
}

/// Trace id of the current request, available from request extensions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceId(pub String);

impl TraceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

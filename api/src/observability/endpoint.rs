//! Prometheus scrape endpoint

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use super::recorder::get_metrics_manager;

/// Render the global recorder in the Prometheus text format
pub async fn metrics_endpoint() -> Response {
    let manager = match get_metrics_manager() {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!("Metrics manager not initialized: {}", e);
            return (StatusCode::SERVICE_UNAVAILABLE, "Metrics not available").into_response();
        }
    };

    let metrics_content = manager.render();
    tracing::debug!(metrics_size = %metrics_content.len(), "Metrics served");

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        metrics_content,
    )
        .into_response()
}

/// Stand-in for the scrape endpoint when metrics are switched off
pub async fn metrics_disabled() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "Metrics disabled").into_response()
}

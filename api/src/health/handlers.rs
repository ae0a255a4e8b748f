use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use tracing::debug;

use super::{HealthManager, HealthResponse, HealthStatus};

/// Liveness probe: the process is up, regardless of backend state
pub async fn liveness_handler() -> (StatusCode, &'static str) {
    debug!("Liveness check requested");
    (StatusCode::OK, "OK")
}

/// Readiness probe: JSON with per-service statuses.
///
/// `Starting` is tolerated during the startup grace period; after it, and
/// whenever a service is unhealthy, the probe answers 503.
pub async fn readiness_handler(
    State(health_manager): State<HealthManager>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    debug!("Readiness check requested");

    let health_response = health_manager.get_health().await;

    match health_response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => Ok(Json(health_response)),
        HealthStatus::Starting if health_manager.is_in_startup_period() => Ok(Json(health_response)),
        HealthStatus::Starting | HealthStatus::Unhealthy => {
            Err((StatusCode::SERVICE_UNAVAILABLE, Json(health_response)))
        }
    }
}

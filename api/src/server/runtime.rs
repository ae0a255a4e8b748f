use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    middleware,
    routing::{get, MethodRouter},
    Router,
};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::Notify;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::health::{liveness_handler, readiness_handler};
use crate::middleware::{metrics_middleware, trace_requests};
use crate::observability::{metrics_disabled, metrics_endpoint};
use crate::rest::{comment_routes, AppState};

/// Probe paths also answered for compatibility with older deployments
const LIVENESS_ALIAS: &str = "/health/liveness";
const READINESS_ALIAS: &str = "/health/readiness";

/// Bind the configured address and serve until SIGINT or SIGTERM
pub async fn start_server(config: AppConfig, state: AppState) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.bind, config.server.port);
    info!("Starting comment API server on {}", bind_addr);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}. Is another process using this port?", bind_addr, e))?;
    info!("Server successfully bound to {}", bind_addr);

    serve_with_shutdown(listener, config, state, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves.
///
/// In-flight requests get `server.shutdown_timeout` seconds to finish once
/// shutdown starts.
pub async fn serve_with_shutdown(
    listener: TcpListener,
    config: AppConfig,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let health = state.health.clone();
    let app = create_router(&config, state);

    let started = Arc::new(Notify::new());
    let trigger = started.clone();
    let graceful = async move {
        shutdown.await;
        trigger.notify_one();
    };

    health.mark_ready().await;
    info!(address = ?listener.local_addr().ok(), "Serving HTTP requests");

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(graceful)
        .into_future();
    let drain_deadline = async {
        started.notified().await;
        tokio::time::sleep(Duration::from_secs(config.server.shutdown_timeout)).await;
    };

    tokio::select! {
        result = server => result?,
        _ = drain_deadline => {
            warn!(timeout_seconds = config.server.shutdown_timeout, "Graceful shutdown timed out, dropping open connections");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Register `route` unless `path` already has one
fn route_once(
    router: Router<AppState>,
    taken: &mut Vec<String>,
    path: &str,
    route: MethodRouter<AppState>,
) -> Router<AppState> {
    if taken.iter().any(|p| p == path) {
        return router;
    }
    taken.push(path.to_string());
    router.route(path, route)
}

/// Resource routes under the base path, probes and metrics at the root
pub fn create_router(config: &AppConfig, state: AppState) -> Router {
    let mut taken = Vec::new();
    let mut router = Router::new().nest(&state.base_path, comment_routes(&state));

    router = route_once(router, &mut taken, &config.health.liveness_path, get(liveness_handler));
    router = route_once(router, &mut taken, &config.health.readiness_path, get(readiness_handler));
    router = route_once(router, &mut taken, LIVENESS_ALIAS, get(liveness_handler));
    router = route_once(router, &mut taken, READINESS_ALIAS, get(readiness_handler));

    let metrics_route = if config.metrics.enabled {
        get(metrics_endpoint)
    } else {
        get(metrics_disabled)
    };
    router = route_once(router, &mut taken, &config.metrics.path, metrics_route);

    router
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(trace_requests))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

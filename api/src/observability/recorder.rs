//! Prometheus metrics recorder
//!
//! The recorder is process-global, so it is installed at most once and
//! shared through [`get_metrics_manager`]. Metrics are served by the API
//! router itself rather than a separate exporter listener.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use anyhow::{Result, anyhow};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::Environment;

/// Global metrics manager with Prometheus integration
pub struct MetricsManager {
    handle: PrometheusHandle,
    environment: Environment,
}

impl MetricsManager {
    /// Install the Prometheus recorder with service-level labels
    fn install(environment: Environment) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .add_global_label("service", "comment-api")
            .add_global_label("environment", environment.as_str())
            .add_global_label("version", env!("CARGO_PKG_VERSION"))
            .install_recorder()
            .map_err(|e| anyhow!("Failed to install Prometheus recorder: {}", e))?;

        tracing::info!(
            environment = %environment.as_str(),
            "Prometheus metrics recorder initialized"
        );

        Ok(Self { handle, environment })
    }

    /// Get Prometheus metrics output
    pub fn render(&self) -> String {
        self.handle.render()
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }
}

static METRICS_MANAGER: OnceLock<Arc<MetricsManager>> = OnceLock::new();
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Initialize the global metrics manager.
///
/// Repeated calls return the manager installed by the first one.
pub fn init_metrics(environment: Environment) -> Result<Arc<MetricsManager>> {
    let _guard = INIT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(existing) = METRICS_MANAGER.get() {
        return Ok(existing.clone());
    }

    let manager = Arc::new(MetricsManager::install(environment)?);
    Ok(METRICS_MANAGER.get_or_init(|| manager).clone())
}

/// Get global metrics manager instance
pub fn get_metrics_manager() -> Result<Arc<MetricsManager>> {
    METRICS_MANAGER
        .get()
        .cloned()
        .ok_or_else(|| anyhow!("Metrics manager not initialized. Call init_metrics() first."))
}

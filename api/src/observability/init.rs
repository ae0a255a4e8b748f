//! Observability initialization at server startup

use anyhow::Result;

use crate::config::AppConfig;
use super::logging::init_logging;
use super::recorder::init_metrics;

/// Install the tracing subscriber and, when enabled, the metrics recorder
pub fn init_observability(config: &AppConfig) -> Result<()> {
    init_logging(&config.logging)?;

    if config.metrics.enabled {
        init_metrics(config.environment)?;
    }

    tracing::info!(
        environment = %config.environment.as_str(),
        log_format = %config.logging.format,
        metrics_enabled = %config.metrics.enabled,
        "Observability components initialized"
    );
    Ok(())
}

//! Structured logging setup
//!
//! - JSON format for production environments
//! - Pretty format for development environments
//! - `RUST_LOG` overrides the configured level when set

use anyhow::{Result, anyhow};
use tracing_subscriber::{
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Build the env filter: `RUST_LOG` first, then the configured level
fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e)),
    }
}

/// Install the global tracing subscriber.
///
/// Fails when the format is unsupported or a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(config)?);

    match config.format.as_str() {
        "json" => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_thread_names(true)
                .with_target(true)
                .with_file(false)
                .with_line_number(false);

            registry.with(fmt_layer).try_init()?;
        }
        "pretty" => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
                .with_target(true);

            registry.with(fmt_layer).try_init()?;
        }
        _ => {
            return Err(anyhow!(
                "Unsupported log format: {}. Use 'json' or 'pretty'",
                config.format
            ));
        }
    }

    tracing::info!(level = %config.level, format = %config.format, "Structured logging initialized");
    Ok(())
}

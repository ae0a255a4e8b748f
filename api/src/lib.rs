pub mod config;
pub mod error;
pub mod health;
pub mod middleware;
pub mod observability;
pub mod rest;
pub mod schema;
pub mod server;
pub mod services;

pub use config::*;
pub use error::*;
pub use server::*;

use anyhow::Result;
use clap::Parser;
use std::panic;

/// Main server entry point for the binary
pub async fn run_server() -> Result<()> {
    panic::set_hook(Box::new(|panic_info| {
        ::tracing::error!(?panic_info, "FATAL: Panic occurred");
        std::process::exit(1);
    }));

    run_server_with(Cli::parse()).await
}

/// Load configuration for `cli`, initialize observability and serve
pub async fn run_server_with(cli: Cli) -> Result<()> {
    let app_config = config::load_config_from(&cli)?;

    observability::init_observability(&app_config)?;
    ::tracing::info!(
        environment = %app_config.environment.as_str(),
        application = %app_config.api.application_name,
        "Comment API starting up"
    );

    let state = rest::AppState::in_memory(&app_config)?;
    server::start_server(app_config, state).await
}

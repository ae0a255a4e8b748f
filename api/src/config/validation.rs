use anyhow::{Result, bail};
use clap::Parser;
use figment::{Figment, providers::{Env, Format, Toml, Serialized}};
use garde::Validate;

use super::AppConfig;

#[derive(Parser, Clone, Debug, Default)]
#[command(name = "comment-api", about = "Comment REST service with a search mirror")]
pub struct Cli {
    /// Path to an additional configuration file
    #[arg(long, env = "APP_CONFIG")]
    pub config: Option<std::path::PathBuf>,

    /// Server port
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Environment name
    #[arg(long, env = "ENVIRONMENT")]
    pub environment: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// Load configuration from the process arguments and environment
pub fn load_config() -> Result<AppConfig> {
    load_config_from(&Cli::parse())
}

/// Load configuration with the layered hierarchy:
/// defaults, `config/default.toml`, `config/{env}.toml`, `--config` file,
/// `APP_` environment variables, then CLI flags.
pub fn load_config_from(cli: &Cli) -> Result<AppConfig> {
    let env_name = cli.environment.clone().unwrap_or_else(||
        std::env::var("ENVIRONMENT").unwrap_or_else(|_| "production".to_string())
    );

    let mut figment = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file("config/default.toml"))
        .merge(Toml::file(format!("config/{}.toml", env_name)));

    if let Some(path) = &cli.config {
        if !path.exists() {
            bail!("Configuration file {} does not exist", path.display());
        }
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("APP_").split("__"));

    if let Some(port) = cli.port {
        figment = figment.merge(Serialized::default("server.port", port));
    }
    if cli.debug {
        figment = figment.merge(Serialized::default("logging.level", "debug"));
    }

    let config: AppConfig = figment.extract()?;
    validate_config(&config)?;

    Ok(config)
}

/// Field rules via garde, then rules spanning several fields
pub fn validate_config(config: &AppConfig) -> Result<()> {
    config.validate()?;

    if config.pagination.default_page_size > config.pagination.max_page_size {
        bail!(
            "pagination.default_page_size ({}) exceeds pagination.max_page_size ({})",
            config.pagination.default_page_size,
            config.pagination.max_page_size
        );
    }

    let probe_paths = [
        &config.health.liveness_path,
        &config.health.readiness_path,
        &config.metrics.path,
    ];
    for (i, path) in probe_paths.iter().enumerate() {
        if probe_paths[..i].contains(path) {
            bail!("{} is configured for more than one endpoint", path);
        }
    }

    let base = config.api.base_path.trim_end_matches('/');
    for (name, path) in [
        ("health.liveness_path", &config.health.liveness_path),
        ("health.readiness_path", &config.health.readiness_path),
        ("metrics.path", &config.metrics.path),
    ] {
        if path.starts_with(&format!("{}/", base)) || path == base {
            bail!("{} ({}) collides with api.base_path ({})", name, path, base);
        }
    }

    Ok(())
}

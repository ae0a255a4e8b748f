use garde::Validate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, Validate, Default)]
pub struct AppConfig {
    #[garde(dive)]
    #[serde(default)]
    pub server: ServerConfig,

    #[garde(dive)]
    #[serde(default)]
    pub logging: LoggingConfig,

    #[garde(dive)]
    #[serde(default)]
    pub health: HealthConfig,

    #[garde(dive)]
    #[serde(default)]
    pub api: ApiConfig,

    #[garde(dive)]
    #[serde(default)]
    pub pagination: PaginationConfig,

    #[garde(dive)]
    #[serde(default)]
    pub store: StoreConfig,

    #[garde(dive)]
    #[serde(default)]
    pub metrics: MetricsConfig,

    #[garde(skip)]
    #[serde(default)]
    pub environment: Environment,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ServerConfig {
    #[garde(range(min = 1024, max = 65535))]
    pub port: u16,

    #[garde(length(min = 1), custom(validate_bind_address))]
    #[serde(default = "default_bind")]
    pub bind: String,

    #[garde(range(min = 1, max = 300))]
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64, // seconds
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            bind: default_bind(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct LoggingConfig {
    #[garde(length(min = 1))]
    #[serde(default = "default_log_level")]
    pub level: String, // trace, debug, info, warn, error

    #[garde(pattern(r"^(json|pretty)$"))]
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct HealthConfig {
    #[garde(length(min = 1), custom(validate_path))]
    #[serde(default = "default_liveness_path")]
    pub liveness_path: String,

    #[garde(length(min = 1), custom(validate_path))]
    #[serde(default = "default_readiness_path")]
    pub readiness_path: String,

    #[garde(range(min = 1, max = 3600))]
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_seconds: u32,
}

fn default_liveness_path() -> String {
    "/health".to_string()
}

fn default_readiness_path() -> String {
    "/health/ready".to_string()
}

fn default_startup_timeout() -> u32 {
    300
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            liveness_path: default_liveness_path(),
            readiness_path: default_readiness_path(),
            startup_timeout_seconds: default_startup_timeout(),
        }
    }
}

/// REST surface settings
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ApiConfig {
    /// Prefix every resource route is nested under
    #[garde(length(min = 2), custom(validate_path))]
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Used in alert header names and message keys, e.g. `X-commentApp-alert`
    #[garde(length(min = 1), pattern(r"^[A-Za-z][A-Za-z0-9_-]*$"))]
    #[serde(default = "default_application_name")]
    pub application_name: String,
}

fn default_base_path() -> String {
    "/api".to_string()
}

fn default_application_name() -> String {
    "commentApp".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            application_name: default_application_name(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct PaginationConfig {
    #[garde(range(min = 1, max = 10000))]
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    #[garde(range(min = 1, max = 10000))]
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

fn default_page_size() -> usize {
    20
}

fn default_max_page_size() -> usize {
    2000
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct StoreConfig {
    /// First id handed out by the record store
    #[garde(range(min = 1))]
    #[serde(default = "default_sequence_start")]
    pub sequence_start: i64,
}

fn default_sequence_start() -> i64 {
    1
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sequence_start: default_sequence_start(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct MetricsConfig {
    #[garde(skip)]
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,

    #[garde(length(min = 1), custom(validate_path))]
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            path: default_metrics_path(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    #[default]
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

fn validate_bind_address(value: &str, _: &()) -> garde::Result {
    value.parse::<std::net::IpAddr>()
        .map(|_| ())
        .map_err(|_| garde::Error::new("Invalid IP address"))
}

fn validate_path(value: &str, _: &()) -> garde::Result {
    if value.starts_with('/') {
        Ok(())
    } else {
        Err(garde::Error::new("Path must start with '/'"))
    }
}

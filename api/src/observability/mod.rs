//! Observability: structured logging and Prometheus metrics

pub mod endpoint;
pub mod init;
pub mod logging;
pub mod metrics;
pub mod recorder;

pub use endpoint::{metrics_disabled, metrics_endpoint};
pub use init::init_observability;
pub use logging::init_logging;
pub use self::metrics::{MirrorOutcome, bucket_status_code, record_http_request, record_mirror_operation, record_store_write};
pub use recorder::{MetricsManager, get_metrics_manager, init_metrics};

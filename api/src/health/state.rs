use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::services::database::{CommentRepository, DatabaseHealth};
use crate::services::search::CommentSearchRepository;

/// Service names reported by the readiness probe
pub const API_SERVICE: &str = "api";
pub const STORE_SERVICE: &str = "comment_store";
pub const SEARCH_SERVICE: &str = "search_mirror";

/// Health status for individual services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Service is fully operational
    Healthy,
    /// Service is operational but with reduced capacity
    Degraded,
    /// Service is not operational
    Unhealthy,
    /// Service is still starting up
    Starting,
}

impl HealthStatus {
    /// Lower is worse
    fn priority(&self) -> u8 {
        match self {
            HealthStatus::Unhealthy => 0,
            HealthStatus::Starting => 1,
            HealthStatus::Degraded => 2,
            HealthStatus::Healthy => 3,
        }
    }
}

/// Information about a service's health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    pub message: String,
    pub last_checked: Option<std::time::SystemTime>,
    pub metadata: HashMap<String, String>,
}

impl ServiceHealth {
    fn new(status: HealthStatus, message: impl Into<String>) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert("updated_at".to_string(), chrono::Utc::now().to_rfc3339());

        Self {
            status,
            message: message.into(),
            last_checked: Some(std::time::SystemTime::now()),
            metadata,
        }
    }
}

/// Overall health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status (worst of all services)
    pub status: HealthStatus,
    pub services: HashMap<String, ServiceHealth>,
    pub timestamp: std::time::SystemTime,
    pub uptime_seconds: u64,
}

/// Cached health check result with TTL
#[derive(Debug, Clone)]
struct CachedHealth {
    response: HealthResponse,
    cached_at: Instant,
    ttl: Duration,
}

impl CachedHealth {
    fn new(response: HealthResponse, ttl: Duration) -> Self {
        Self {
            response,
            cached_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.cached_at.elapsed() > self.ttl
    }

    fn is_stale(&self, max_stale: Duration) -> bool {
        self.cached_at.elapsed() > (self.ttl + max_stale)
    }
}

/// Backends probed on every health refresh
#[derive(Clone)]
struct Dependencies {
    store: Arc<dyn CommentRepository>,
    search: Arc<dyn CommentSearchRepository>,
}

/// Health check manager with caching and state tracking
#[derive(Clone)]
pub struct HealthManager {
    services: Arc<RwLock<HashMap<String, ServiceHealth>>>,
    cache: Arc<RwLock<Option<CachedHealth>>>,
    /// Set while a background refresh is running
    refreshing: Arc<AtomicBool>,
    dependencies: Option<Dependencies>,
    startup_time: Instant,
    cache_ttl: Duration,
    max_stale_duration: Duration,
    startup_grace_period: Duration,
}

impl HealthManager {
    pub fn new() -> Self {
        let mut services = HashMap::new();
        services.insert(
            API_SERVICE.to_string(),
            ServiceHealth::new(HealthStatus::Starting, "API server starting up"),
        );

        Self {
            services: Arc::new(RwLock::new(services)),
            cache: Arc::new(RwLock::new(None)),
            refreshing: Arc::new(AtomicBool::new(false)),
            dependencies: None,
            startup_time: Instant::now(),
            cache_ttl: Duration::from_secs(5),
            max_stale_duration: Duration::from_secs(30),
            startup_grace_period: Duration::from_secs(30),
        }
    }

    /// Probe the record store and search mirror on each refresh
    pub fn with_dependencies(
        mut self,
        store: Arc<dyn CommentRepository>,
        search: Arc<dyn CommentSearchRepository>,
    ) -> Self {
        self.dependencies = Some(Dependencies { store, search });
        self
    }

    pub fn with_startup_grace_period(mut self, grace: Duration) -> Self {
        self.startup_grace_period = grace;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Mark the API service as ready (called after the listener is bound)
    pub async fn mark_ready(&self) {
        self.update_service_health(API_SERVICE, HealthStatus::Healthy, "API server is ready".to_string())
            .await;
        info!("API service marked as ready");
    }

    /// Update the health status of a service
    pub async fn update_service_health(&self, service_name: &str, status: HealthStatus, message: String) {
        let mut services = self.services.write().await;
        let changed = services
            .get(service_name)
            .map(|current| current.status != status)
            .unwrap_or(true);

        services.insert(service_name.to_string(), ServiceHealth::new(status.clone(), message));
        drop(services);

        // Clear cache when status changes
        *self.cache.write().await = None;
        if changed {
            info!("Updated health status for service '{}': {:?}", service_name, status);
        }
    }

    /// Get the current health status with caching
    pub async fn get_health(&self) -> HealthResponse {
        let cache_guard = self.cache.read().await;
        if let Some(cached) = &*cache_guard {
            if !cached.is_expired() {
                return cached.response.clone();
            }
            // Serve a stale answer while refreshing in the background
            if !cached.is_stale(self.max_stale_duration) {
                let stale_response = cached.response.clone();
                drop(cache_guard);

                // At most one background refresh at a time
                if self
                    .refreshing
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    tokio::spawn({
                        let health_manager = self.clone();
                        async move {
                            let _ = health_manager.refresh_health().await;
                            health_manager.refreshing.store(false, Ordering::Release);
                        }
                    });
                }

                return stale_response;
            }
        }
        drop(cache_guard);

        self.refresh_health().await
    }

    /// Ping the backends and record their status
    async fn probe_dependencies(&self) {
        let Some(dependencies) = &self.dependencies else {
            return;
        };

        let (status, message) = match dependencies.store.health_check().await {
            DatabaseHealth::Healthy => (HealthStatus::Healthy, "Record store available".to_string()),
            DatabaseHealth::Degraded(reason) => (HealthStatus::Degraded, reason),
            DatabaseHealth::Unhealthy(reason) => (HealthStatus::Unhealthy, reason),
            DatabaseHealth::Starting => (HealthStatus::Starting, "Record store starting".to_string()),
        };
        self.update_service_health(STORE_SERVICE, status, message).await;

        // Reads and writes still reach the store when the mirror is down
        let (status, message) = match dependencies.search.ping().await {
            Ok(()) => (HealthStatus::Healthy, "Search mirror available".to_string()),
            Err(e) => {
                warn!(error = %e, "Search mirror ping failed");
                (HealthStatus::Degraded, e.to_string())
            }
        };
        self.update_service_health(SEARCH_SERVICE, status, message).await;
    }

    async fn refresh_health(&self) -> HealthResponse {
        self.probe_dependencies().await;

        let services = self.services.read().await.clone();

        let overall_status = services
            .values()
            .map(|s| &s.status)
            .min_by_key(|status| status.priority())
            .cloned()
            .unwrap_or(HealthStatus::Healthy);

        let response = HealthResponse {
            status: overall_status,
            services,
            timestamp: std::time::SystemTime::now(),
            uptime_seconds: self.startup_time.elapsed().as_secs(),
        };

        let cached = CachedHealth::new(response.clone(), self.cache_ttl);
        *self.cache.write().await = Some(cached);

        response
    }

    /// Check if we're still in startup grace period
    pub fn is_in_startup_period(&self) -> bool {
        self.startup_time.elapsed() < self.startup_grace_period
    }
}

impl Default for HealthManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Comment;
    use crate::services::database::DatabaseError;
    use crate::services::paging::{Page, Pageable};
    use crate::services::{InMemoryCommentRepository, RecordingSearchRepository};

    #[tokio::test]
    async fn test_health_manager_initialization() {
        let manager = HealthManager::new();
        let health = manager.get_health().await;

        assert_eq!(health.status, HealthStatus::Starting);
        assert_eq!(health.services[API_SERVICE].status, HealthStatus::Starting);
    }

    #[tokio::test]
    async fn test_mark_ready() {
        let manager = HealthManager::new();
        manager.mark_ready().await;

        let health = manager.get_health().await;
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.services[API_SERVICE].status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_overall_status_is_worst_service() {
        let manager = HealthManager::new();
        manager.mark_ready().await;
        manager.update_service_health("cache", HealthStatus::Degraded, "High latency".to_string()).await;

        let health = manager.get_health().await;
        assert_eq!(health.status, HealthStatus::Degraded);
        assert_eq!(health.services["cache"].message, "High latency");
    }

    #[tokio::test]
    async fn test_caching_mechanism() {
        let manager = HealthManager::new();
        manager.mark_ready().await;

        let health1 = manager.get_health().await;
        let health2 = manager.get_health().await;

        // Same timestamp means cached
        assert_eq!(health1.timestamp, health2.timestamp);
    }

    #[tokio::test]
    async fn test_dependencies_are_probed() {
        let store = Arc::new(InMemoryCommentRepository::new());
        let search = Arc::new(RecordingSearchRepository::new());
        let manager = HealthManager::new().with_dependencies(store, search);
        manager.mark_ready().await;

        let health = manager.get_health().await;
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.services[STORE_SERVICE].status, HealthStatus::Healthy);
        assert_eq!(health.services[SEARCH_SERVICE].status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_failing_mirror_degrades_health() {
        let store = Arc::new(InMemoryCommentRepository::new());
        let search = Arc::new(RecordingSearchRepository::new().failing());
        let manager = HealthManager::new().with_dependencies(store, search);
        manager.mark_ready().await;

        let health = manager.get_health().await;
        assert_eq!(health.status, HealthStatus::Degraded);
        assert_eq!(health.services[SEARCH_SERVICE].status, HealthStatus::Degraded);
    }

    /// Record store that counts health checks
    #[derive(Clone, Default)]
    struct CountingStore {
        inner: InMemoryCommentRepository,
        checks: Arc<std::sync::atomic::AtomicUsize>,
    }

    impl CountingStore {
        fn checks(&self) -> usize {
            self.checks.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl CommentRepository for CountingStore {
        async fn health_check(&self) -> DatabaseHealth {
            self.checks.fetch_add(1, Ordering::SeqCst);
            DatabaseHealth::Healthy
        }

        async fn create(&self, comment: Comment) -> Result<Comment, DatabaseError> {
            self.inner.create(comment).await
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, DatabaseError> {
            self.inner.find_by_id(id).await
        }

        async fn find_all(&self, pageable: &Pageable) -> Result<Page<Comment>, DatabaseError> {
            self.inner.find_all(pageable).await
        }

        async fn save(&self, comment: Comment) -> Result<Comment, DatabaseError> {
            self.inner.save(comment).await
        }

        async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
            self.inner.delete(id).await
        }

        async fn count(&self) -> Result<u64, DatabaseError> {
            self.inner.count().await
        }
    }

    #[tokio::test]
    async fn test_stale_reads_share_one_background_refresh() {
        let store = CountingStore::default();
        let manager = HealthManager::new()
            .with_cache_ttl(Duration::ZERO)
            .with_dependencies(Arc::new(store.clone()), Arc::new(RecordingSearchRepository::new()));

        manager.get_health().await;
        assert_eq!(store.checks(), 1);

        // Every read sees an expired but not stale entry
        for _ in 0..10 {
            manager.get_health().await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.checks(), 2);

        // Once the refresh finished, the next stale read may start another
        manager.get_health().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.checks(), 3);
    }

    #[tokio::test]
    async fn test_startup_grace_period() {
        let manager = HealthManager::new();
        assert!(manager.is_in_startup_period());

        let manager = HealthManager::new().with_startup_grace_period(Duration::ZERO);
        assert!(!manager.is_in_startup_period());
    }
}

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::FromRef;

use crate::config::{AppConfig, PaginationConfig};
use crate::health::HealthManager;
use crate::rest::headers::AlertHeaders;
use crate::services::database::{CommentRepository, InMemoryCommentRepository};
use crate::services::search::{CommentSearchRepository, InMemorySearchIndex};

/// Shared handles for the comment resource and the probes
#[derive(Clone)]
pub struct AppState {
    pub comments: Arc<dyn CommentRepository>,
    pub search: Arc<dyn CommentSearchRepository>,
    pub health: HealthManager,
    pub alerts: AlertHeaders,
    pub pagination: PaginationConfig,
    pub base_path: String,
}

impl AppState {
    /// Wire the given backends with the resource settings from `config`
    pub fn new(
        config: &AppConfig,
        comments: Arc<dyn CommentRepository>,
        search: Arc<dyn CommentSearchRepository>,
    ) -> Result<Self> {
        let health = HealthManager::new()
            .with_startup_grace_period(Duration::from_secs(config.health.startup_timeout_seconds.into()))
            .with_dependencies(comments.clone(), search.clone());

        Ok(Self {
            comments,
            search,
            health,
            alerts: AlertHeaders::new(&config.api.application_name)?,
            pagination: config.pagination.clone(),
            base_path: config.api.base_path.trim_end_matches('/').to_string(),
        })
    }

    /// In-process record store and search index
    pub fn in_memory(config: &AppConfig) -> Result<Self> {
        let comments = InMemoryCommentRepository::with_sequence_start(config.store.sequence_start);
        Self::new(config, Arc::new(comments), Arc::new(InMemorySearchIndex::new()))
    }

    /// Path a created comment is reachable under
    pub fn comment_location(&self, id: i64) -> String {
        format!("{}/comments/{}", self.base_path, id)
    }
}

impl FromRef<AppState> for HealthManager {
    fn from_ref(state: &AppState) -> Self {
        state.health.clone()
    }
}

impl FromRef<AppState> for AlertHeaders {
    fn from_ref(state: &AppState) -> Self {
        state.alerts.clone()
    }
}

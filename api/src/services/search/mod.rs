use async_trait::async_trait;
use thiserror::Error;

use crate::schema::Comment;
use crate::services::paging::{Page, Pageable};

pub mod index;
pub mod query;
pub mod recording;

pub use index::InMemorySearchIndex;
pub use query::SearchQuery;
pub use recording::RecordingSearchRepository;

/// Search mirror errors
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid search query: {0}")]
    InvalidQuery(String),

    #[error("Search index unavailable: {0}")]
    Unavailable(String),

    #[error("Internal search error: {0}")]
    Internal(String),
}

/// Derived, non-authoritative index over comments.
///
/// Receives a copy of every persisted comment and a notice of every deletion.
/// It is never consulted for identity or existence.
#[async_trait]
pub trait CommentSearchRepository: Send + Sync {
    /// Check the index is reachable
    async fn ping(&self) -> Result<(), SearchError>;

    /// Index (or re-index) a persisted comment
    async fn save(&self, comment: &Comment) -> Result<(), SearchError>;

    /// Remove a comment from the index
    async fn delete_by_id(&self, id: i64) -> Result<(), SearchError>;

    /// Run a query-string search and return one page of matches
    async fn search(&self, query: &str, pageable: &Pageable) -> Result<Page<Comment>, SearchError>;
}

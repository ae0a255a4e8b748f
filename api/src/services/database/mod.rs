use async_trait::async_trait;
use thiserror::Error;

use crate::schema::Comment;
use crate::services::paging::{Page, Pageable};

pub mod memory;

pub use memory::InMemoryCommentRepository;

/// Record store health status
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseHealth {
    Healthy,
    Degraded(String),
    Unhealthy(String),
    Starting,
}

/// Record store errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Timeout occurred: {0}")]
    Timeout(String),

    #[error("Data validation failed: {0}")]
    ValidationFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Authoritative store for comment records.
///
/// The store owns identity: ids are assigned on `create` (and on `save` of a
/// record without one) and are never reused.
///
/// # Example
/// ```no_run
/// # use comment_api::services::database::{CommentRepository, InMemoryCommentRepository};
/// # use comment_api::schema::Comment;
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let repository = InMemoryCommentRepository::new();
/// let day = chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
///
/// let saved = repository.create(Comment::new("Hello", day)).await?;
/// let found = repository.find_by_id(saved.id.unwrap()).await?;
/// assert_eq!(found, Some(saved));
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Check store health
    async fn health_check(&self) -> DatabaseHealth;

    /// Persist a new record and return it with its assigned id
    async fn create(&self, comment: Comment) -> Result<Comment, DatabaseError>;

    /// Read a record by id
    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, DatabaseError>;

    /// Read one page of records in the requested order
    async fn find_all(&self, pageable: &Pageable) -> Result<Page<Comment>, DatabaseError>;

    /// Insert or fully replace a record by id
    async fn save(&self, comment: Comment) -> Result<Comment, DatabaseError>;

    /// Remove a record; returns whether a record was present
    async fn delete(&self, id: i64) -> Result<bool, DatabaseError>;

    /// Number of stored records
    async fn count(&self) -> Result<u64, DatabaseError>;
}

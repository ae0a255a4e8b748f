use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::schema::Comment;
use crate::services::database::{CommentRepository, DatabaseError, DatabaseHealth};
use crate::services::paging::{Page, Pageable};

/// In-process record store keyed by id, with a monotonically increasing id sequence
#[derive(Debug, Clone)]
pub struct InMemoryCommentRepository {
    records: Arc<RwLock<BTreeMap<i64, Comment>>>,
    sequence: Arc<AtomicI64>,
}

impl InMemoryCommentRepository {
    pub fn new() -> Self {
        Self::with_sequence_start(1)
    }

    /// Start id assignment at `first_id`
    pub fn with_sequence_start(first_id: i64) -> Self {
        Self {
            records: Arc::new(RwLock::new(BTreeMap::new())),
            sequence: Arc::new(AtomicI64::new(first_id)),
        }
    }

    /// Drop every record. The id sequence keeps counting so ids are never reused.
    pub async fn reset(&self) {
        self.records.write().await.clear();
        tracing::debug!("Comment store reset");
    }

    fn next_id(&self) -> i64 {
        self.sequence.fetch_add(1, Ordering::SeqCst)
    }

    /// Keep the sequence ahead of explicitly supplied ids
    fn observe_id(&self, id: i64) {
        self.sequence.fetch_max(id.saturating_add(1), Ordering::SeqCst);
    }
}

impl Default for InMemoryCommentRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn health_check(&self) -> DatabaseHealth {
        DatabaseHealth::Healthy
    }

    async fn create(&self, comment: Comment) -> Result<Comment, DatabaseError> {
        if let Some(id) = comment.id {
            return Err(DatabaseError::ValidationFailed(format!(
                "comment already has id {}",
                id
            )));
        }

        let id = self.next_id();
        let saved = comment.with_id(id);
        self.records.write().await.insert(id, saved.clone());
        tracing::debug!(comment_id = id, "Comment created");
        Ok(saved)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, DatabaseError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn find_all(&self, pageable: &Pageable) -> Result<Page<Comment>, DatabaseError> {
        let records: Vec<Comment> = self.records.read().await.values().cloned().collect();
        Ok(pageable.apply(records))
    }

    async fn save(&self, comment: Comment) -> Result<Comment, DatabaseError> {
        let id = match comment.id {
            Some(id) => {
                self.observe_id(id);
                id
            }
            None => self.next_id(),
        };

        let saved = comment.with_id(id);
        self.records.write().await.insert(id, saved.clone());
        tracing::debug!(comment_id = id, "Comment saved");
        Ok(saved)
    }

    async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let removed = self.records.write().await.remove(&id).is_some();
        tracing::debug!(comment_id = id, removed, "Comment delete");
        Ok(removed)
    }

    async fn count(&self) -> Result<u64, DatabaseError> {
        Ok(self.records.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::paging::{SortOrder, SortProperty};
    use chrono::NaiveDate;

    fn comment(text: &str) -> Comment {
        Comment::new(text, NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
    }

    #[tokio::test]
    async fn test_create_assigns_fresh_ids() {
        let repository = InMemoryCommentRepository::new();

        let first = repository.create(comment("a")).await.unwrap();
        let second = repository.create(comment("b")).await.unwrap();

        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert_eq!(repository.count().await.unwrap(), 2);
        assert_eq!(repository.find_by_id(1).await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_create_rejects_existing_id() {
        let repository = InMemoryCommentRepository::new();

        let result = repository.create(comment("a").with_id(5)).await;

        assert!(matches!(result, Err(DatabaseError::ValidationFailed(_))));
        assert_eq!(repository.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_save_upserts_and_advances_sequence() {
        let repository = InMemoryCommentRepository::new();

        let explicit = repository.save(comment("explicit").with_id(10)).await.unwrap();
        assert_eq!(explicit.id, Some(10));

        let replaced = repository.save(comment("replaced").with_id(10)).await.unwrap();
        assert_eq!(repository.count().await.unwrap(), 1);
        assert_eq!(repository.find_by_id(10).await.unwrap(), Some(replaced));

        let created = repository.create(comment("next")).await.unwrap();
        assert_eq!(created.id, Some(11));
    }

    #[tokio::test]
    async fn test_save_without_id_assigns_one() {
        let repository = InMemoryCommentRepository::with_sequence_start(1000);

        let saved = repository.save(comment("a")).await.unwrap();

        assert_eq!(saved.id, Some(1000));
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let repository = InMemoryCommentRepository::new();
        let saved = repository.create(comment("a")).await.unwrap();
        let id = saved.id.unwrap();

        assert!(repository.delete(id).await.unwrap());
        assert!(!repository.delete(id).await.unwrap());
        assert_eq!(repository.find_by_id(id).await.unwrap(), None);
        assert_eq!(repository.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_all_sorted() {
        let repository = InMemoryCommentRepository::new();
        for text in ["a", "b", "c"] {
            repository.create(comment(text)).await.unwrap();
        }

        let pageable = Pageable::new(0, 2).with_sort(SortOrder::desc(SortProperty::Id));
        let page = repository.find_all(&pageable).await.unwrap();

        let ids: Vec<i64> = page.content.iter().filter_map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 2]);
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn test_reset_keeps_sequence() {
        let repository = InMemoryCommentRepository::new();
        repository.create(comment("a")).await.unwrap();

        repository.reset().await;
        assert_eq!(repository.count().await.unwrap(), 0);

        let after = repository.create(comment("b")).await.unwrap();
        assert_eq!(after.id, Some(2));
    }
}

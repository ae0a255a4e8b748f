use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::schema::Comment;
use crate::services::paging::{Page, Pageable};
use crate::services::search::{CommentSearchRepository, SearchError, SearchQuery};

/// In-process search index holding a denormalized copy of each comment
#[derive(Debug, Clone, Default)]
pub struct InMemorySearchIndex {
    documents: Arc<RwLock<BTreeMap<i64, Comment>>>,
}

impl InMemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.documents.write().await.clear();
    }
}

#[async_trait]
impl CommentSearchRepository for InMemorySearchIndex {
    async fn ping(&self) -> Result<(), SearchError> {
        Ok(())
    }

    async fn save(&self, comment: &Comment) -> Result<(), SearchError> {
        let id = comment.id.ok_or_else(|| {
            SearchError::Internal("cannot index a comment without an id".to_string())
        })?;
        self.documents.write().await.insert(id, comment.clone());
        tracing::debug!(comment_id = id, "Comment indexed");
        Ok(())
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), SearchError> {
        self.documents.write().await.remove(&id);
        tracing::debug!(comment_id = id, "Comment removed from index");
        Ok(())
    }

    async fn search(&self, query: &str, pageable: &Pageable) -> Result<Page<Comment>, SearchError> {
        let parsed = SearchQuery::parse(query)?;
        let hits: Vec<Comment> = self
            .documents
            .read()
            .await
            .values()
            .filter(|comment| parsed.matches(comment))
            .cloned()
            .collect();

        tracing::debug!(query = %query, hits = hits.len(), "Search executed");
        Ok(pageable.apply(hits))
    }
}

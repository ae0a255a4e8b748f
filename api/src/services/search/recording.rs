use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::schema::Comment;
use crate::services::paging::{Page, Pageable};
use crate::services::search::{CommentSearchRepository, SearchError};

#[derive(Debug, Default)]
struct Recorded {
    saved: Vec<Comment>,
    deleted: Vec<i64>,
    searches: Vec<(String, Pageable)>,
    stubs: HashMap<String, Vec<Comment>>,
    failing: bool,
}

/// Search repository double that records every call.
///
/// Searches answer from results stubbed per query string; unstubbed queries
/// return an empty page. In failing mode every call is still recorded and then
/// answered with `SearchError::Unavailable`.
#[derive(Debug, Clone, Default)]
pub struct RecordingSearchRepository {
    state: Arc<Mutex<Recorded>>,
}

impl RecordingSearchRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail
    pub fn failing(self) -> Self {
        self.lock().failing = true;
        self
    }

    /// Answer `query` with `results`
    pub fn stub_search(&self, query: impl Into<String>, results: Vec<Comment>) {
        self.lock().stubs.insert(query.into(), results);
    }

    /// Every comment passed to `save`, in call order
    pub fn saved(&self) -> Vec<Comment> {
        self.lock().saved.clone()
    }

    /// Every id passed to `delete_by_id`, in call order
    pub fn deleted(&self) -> Vec<i64> {
        self.lock().deleted.clone()
    }

    /// Every query string and page request passed to `search`
    pub fn searches(&self) -> Vec<(String, Pageable)> {
        self.lock().searches.clone()
    }

    /// Number of `save` calls made with exactly `comment`
    pub fn times_saved(&self, comment: &Comment) -> usize {
        self.lock().saved.iter().filter(|c| *c == comment).count()
    }

    /// Number of `delete_by_id` calls made with `id`
    pub fn times_deleted(&self, id: i64) -> usize {
        self.lock().deleted.iter().filter(|d| **d == id).count()
    }

    /// Forget recorded calls, keeping stubs and failure mode
    pub fn clear_calls(&self) {
        let mut state = self.lock();
        state.saved.clear();
        state.deleted.clear();
        state.searches.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_available(state: &Recorded) -> Result<(), SearchError> {
        if state.failing {
            Err(SearchError::Unavailable("search repository configured to fail".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CommentSearchRepository for RecordingSearchRepository {
    async fn ping(&self) -> Result<(), SearchError> {
        Self::check_available(&self.lock())
    }

    async fn save(&self, comment: &Comment) -> Result<(), SearchError> {
        let mut state = self.lock();
        state.saved.push(comment.clone());
        Self::check_available(&state)
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), SearchError> {
        let mut state = self.lock();
        state.deleted.push(id);
        Self::check_available(&state)
    }

    async fn search(&self, query: &str, pageable: &Pageable) -> Result<Page<Comment>, SearchError> {
        let mut state = self.lock();
        state.searches.push((query.to_string(), pageable.clone()));
        Self::check_available(&state)?;

        let results = state.stubs.get(query).cloned().unwrap_or_default();
        Ok(pageable.apply(results))
    }
}

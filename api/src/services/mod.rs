pub mod database;
pub mod paging;
pub mod search;

pub use database::{CommentRepository, DatabaseError, DatabaseHealth, InMemoryCommentRepository};
pub use paging::{Direction, Page, Pageable, SortOrder, SortProperty};
pub use search::{CommentSearchRepository, InMemorySearchIndex, RecordingSearchRepository, SearchError};

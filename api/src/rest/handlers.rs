//! Comment resource: CRUD over the record store, search over the mirror.
//!
//! Every mutation writes the record store first and then mirrors the result
//! into the search index exactly once. A failed mirror call surfaces as a
//! server error; the store write is not rolled back.

use std::future::Future;
use std::time::Instant;

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json},
};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::observability::metrics::{MirrorOutcome, record_mirror_operation, record_store_write};
use crate::rest::pagination::{pageable_from_params, pagination_headers};
use crate::rest::state::AppState;
use crate::schema::Comment;
use crate::services::search::SearchError;

pub const ENTITY_NAME: &str = "comment";

/// Run a search mirror call, recording its outcome
async fn mirrored<T>(
    operation: &'static str,
    call: impl Future<Output = Result<T, SearchError>>,
) -> Result<T, AppError> {
    let start = Instant::now();
    let result = call.await;

    let outcome = if result.is_ok() { MirrorOutcome::Success } else { MirrorOutcome::Error };
    record_mirror_operation(operation, outcome, start.elapsed());

    result.map_err(|e| {
        warn!(operation, error = %e, "Search mirror call failed");
        AppError::from(e)
    })
}

fn assigned_id(comment: &Comment) -> Result<i64, AppError> {
    comment
        .id
        .ok_or_else(|| AppError::Server("record store returned a comment without an id".to_string()))
}

/// `POST /comments`
pub async fn create_comment(
    State(state): State<AppState>,
    Json(comment): Json<Comment>,
) -> Result<impl IntoResponse, AppError> {
    debug!(comment = ?comment, "REST request to save Comment");
    if comment.is_persisted() {
        return Err(AppError::invalid_request(
            ENTITY_NAME,
            "idexists",
            "A new comment cannot already have an ID",
        ));
    }

    let saved = state.comments.create(comment).await?;
    record_store_write("create");
    let id = assigned_id(&saved)?;

    mirrored("save", state.search.save(&saved)).await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, state.comment_location(id))],
        state.alerts.created(ENTITY_NAME, id),
        Json(saved),
    ))
}

/// `PUT /comments`: full replacement, no existence check
pub async fn update_comment(
    State(state): State<AppState>,
    Json(comment): Json<Comment>,
) -> Result<impl IntoResponse, AppError> {
    debug!(comment = ?comment, "REST request to update Comment");
    if !comment.is_persisted() {
        return Err(AppError::invalid_request(ENTITY_NAME, "idnull", "Invalid id"));
    }

    let saved = state.comments.save(comment).await?;
    record_store_write("update");
    let id = assigned_id(&saved)?;

    mirrored("save", state.search.save(&saved)).await?;

    Ok((state.alerts.updated(ENTITY_NAME, id), Json(saved)))
}

/// `GET /comments?page&size&sort`
pub async fn get_all_comments(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let pageable = pageable_from_params(&params, &state.pagination)?;
    debug!(page = pageable.page, size = pageable.size, "REST request to get a page of Comments");

    let page = state.comments.find_all(&pageable).await?;

    Ok((pagination_headers(&uri, &page), Json(page.content)))
}

/// `GET /comments/{id}`
pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Comment>, AppError> {
    debug!(comment_id = id, "REST request to get Comment");

    state
        .comments
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("comment {}", id)))
}

/// `DELETE /comments/{id}`: succeeds whether or not the record existed
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    debug!(comment_id = id, "REST request to delete Comment");

    let existed = state.comments.delete(id).await?;
    record_store_write("delete");
    if !existed {
        debug!(comment_id = id, "Deleted comment was not in the record store");
    }

    mirrored("delete", state.search.delete_by_id(id)).await?;

    Ok((StatusCode::NO_CONTENT, state.alerts.deleted(ENTITY_NAME, id)))
}

/// `GET /_search/comments?query&page&size&sort`
pub async fn search_comments(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let query = params
        .iter()
        .find(|(name, _)| name == "query")
        .map(|(_, value)| value.clone())
        .ok_or_else(|| AppError::InvalidInput("missing 'query' parameter".to_string()))?;
    let pageable = pageable_from_params(&params, &state.pagination)?;
    debug!(query = %query, "REST request to search for a page of Comments");

    let page = mirrored("search", state.search.search(&query, &pageable)).await?;

    Ok((pagination_headers(&uri, &page), Json(page.content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{body::Body, http::Request, Router};
    use chrono::NaiveDate;
    use tower::ServiceExt;
    use tracing_test::traced_test;

    use crate::config::AppConfig;
    use crate::rest::comment_routes;
    use crate::services::database::CommentRepository;
    use crate::services::{InMemoryCommentRepository, RecordingSearchRepository};

    struct Fixture {
        app: Router,
        store: InMemoryCommentRepository,
        mirror: RecordingSearchRepository,
    }

    fn fixture_with(mirror: RecordingSearchRepository) -> Fixture {
        let store = InMemoryCommentRepository::new();
        let state = AppState::new(
            &AppConfig::default(),
            Arc::new(store.clone()),
            Arc::new(mirror.clone()),
        )
        .unwrap();
        let app = comment_routes(&state).with_state(state);
        Fixture { app, store, mirror }
    }

    fn fixture() -> Fixture {
        fixture_with(RecordingSearchRepository::new())
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
    }

    #[tokio::test]
    #[traced_test]
    async fn test_create_logs_and_mirrors() {
        let fx = fixture();
        let request = json_request(
            "POST",
            "/comments",
            serde_json::json!({"text": "AAAAAAAAAA", "creationDate": "1970-01-01"}),
        );

        let response = fx.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/api/comments/1");
        assert_eq!(response.headers().get("x-commentapp-alert").unwrap(), "commentApp.comment.created");

        let stored = fx.store.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(fx.mirror.times_saved(&stored), 1);
        assert!(logs_contain("REST request to save Comment"));
    }

    #[tokio::test]
    async fn test_create_with_id_is_rejected_without_writes() {
        let fx = fixture();
        let request = json_request("POST", "/comments", serde_json::json!({"id": 1, "text": "x"}));

        let response = fx.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers().get("x-commentapp-error").unwrap(), "error.idexists");
        assert_eq!(response.headers().get("x-commentapp-params").unwrap(), "comment");
        assert_eq!(fx.store.count().await.unwrap(), 0);
        assert!(fx.mirror.saved().is_empty());
    }

    #[tokio::test]
    async fn test_update_without_id_is_rejected() {
        let fx = fixture();
        let request = json_request("PUT", "/comments", serde_json::json!({"text": "x"}));

        let response = fx.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers().get("x-commentapp-error").unwrap(), "error.idnull");
        assert!(fx.mirror.saved().is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_comment_is_not_found() {
        let fx = fixture();
        let request = Request::builder().uri("/comments/999").body(Body::empty()).unwrap();

        let response = fx.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_mirrors_by_id() {
        let fx = fixture();
        let saved = fx.store.create(Comment::new("bye", day())).await.unwrap();
        let id = saved.id.unwrap();

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/comments/{}", id))
            .body(Body::empty())
            .unwrap();

        let response = fx.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers().get("x-commentapp-alert").unwrap(), "commentApp.comment.deleted");
        assert_eq!(fx.store.find_by_id(id).await.unwrap(), None);
        assert_eq!(fx.mirror.deleted(), vec![id]);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_mirror_failure_keeps_store_write() {
        let fx = fixture_with(RecordingSearchRepository::new().failing());
        let request = json_request(
            "POST",
            "/comments",
            serde_json::json!({"text": "kept", "creationDate": "1970-01-01"}),
        );

        let response = fx.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(fx.store.count().await.unwrap(), 1);
        assert_eq!(fx.mirror.saved().len(), 1);
        assert!(logs_contain("Search mirror call failed"));
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let fx = fixture();
        let request = Request::builder().uri("/_search/comments").body(Body::empty()).unwrap();

        let response = fx.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(fx.mirror.searches().is_empty());
    }

    #[tokio::test]
    async fn test_search_delegates_to_mirror_only() {
        let fx = fixture();
        let hit = Comment::new("found", day()).with_id(42);
        fx.mirror.stub_search("id:42", vec![hit.clone()]);

        let request = Request::builder()
            .uri("/_search/comments?query=id:42")
            .body(Body::empty())
            .unwrap();

        let response = fx.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-total-count").unwrap(), "1");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let found: Vec<Comment> = serde_json::from_slice(&body).unwrap();
        assert_eq!(found, vec![hit]);
        assert_eq!(fx.store.count().await.unwrap(), 0);
    }
}

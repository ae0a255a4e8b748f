//! REST surface for the comment resource

pub mod handlers;
pub mod headers;
pub mod pagination;
pub mod state;

pub use handlers::ENTITY_NAME;
pub use headers::AlertHeaders;
pub use state::AppState;

use axum::{
    middleware,
    routing::get,
    Router,
};

use handlers::{
    create_comment, delete_comment, get_all_comments, get_comment, search_comments, update_comment,
};

/// Comment routes, relative to the API base path
pub fn comment_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/comments",
            get(get_all_comments).post(create_comment).put(update_comment),
        )
        .route("/comments/{id}", get(get_comment).delete(delete_comment))
        .route("/_search/comments", get(search_comments))
        .layer(middleware::from_fn_with_state(
            state.alerts.clone(),
            headers::failure_alert_headers,
        ))
}

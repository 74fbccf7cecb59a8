// HTTP surface of the blog: routes, extractors and handlers

pub mod comments;
pub mod extract;
pub mod follows;
pub mod groups;
pub mod posts;

use axum::{middleware, routing::get, Router};
use tower::Layer;
use tower_http::{
    cors::CorsLayer,
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::TraceLayer,
};

use crate::{app_state::AppState, infrastructure::middleware::viewer_context_middleware};

pub const API_PREFIX: &str = "/api/v1";

/// Build the API router with viewer resolution, tracing and CORS applied
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/posts/{post_id}",
            get(posts::get_post)
                .put(posts::update_post)
                .patch(posts::update_post)
                .delete(posts::delete_post),
        )
        .route(
            "/posts/{post_id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/posts/{post_id}/comments/{comment_id}",
            get(comments::get_comment)
                .put(comments::update_comment)
                .patch(comments::update_comment)
                .delete(comments::delete_comment),
        )
        .route("/follow", get(follows::list_follows).post(follows::create_follow))
        .route("/groups", get(groups::list_groups))
        .route("/groups/{group_id}", get(groups::get_group));

    Router::new()
        .nest(API_PREFIX, api)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            viewer_context_middleware::<AppState>,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The router wrapped so that `/posts/` and `/posts` hit the same route.
///
/// Path normalisation has to run before routing, hence the outer wrapper.
pub fn app(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(create_router(state))
}

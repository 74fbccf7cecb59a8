use std::collections::HashMap;

use axum::{
    extract::{OriginalUri, State},
    http::{HeaderMap, Method, StatusCode},
    response::IntoResponse,
    Json,
};

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::{
    app_state::AppState,
    ent_framework::PrivacyOperation,
    error::{AppError, AppResult},
    infrastructure::{middleware::Vc, pagination::Listing},
    models::{post::PostPayload, EntityType, GroupId, Post, PostId},
};

pub(crate) async fn load_post(state: &AppState, id: PostId) -> AppResult<Post> {
    state
        .store
        .get_post(id)
        .await?
        .ok_or_else(|| AppError::NotFound("No Post matches the given query.".to_string()))
}

async fn ensure_group_exists(state: &AppState, group: Option<GroupId>) -> AppResult<()> {
    if let Some(group) = group {
        if state.store.get_group(group).await?.is_none() {
            return Err(AppError::Validation(format!(
                "group: Invalid pk \"{}\" - object does not exist.",
                group
            )));
        }
    }
    Ok(())
}

/// GET /posts - everything, or a page when `limit`/`offset` is present
pub async fn list_posts(
    State(state): State<AppState>,
    vc: Vc,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    ApiQuery(params): ApiQuery<HashMap<String, String>>,
) -> AppResult<Json<Listing<Post>>> {
    state
        .privacy
        .authorize(&vc, EntityType::Post, PrivacyOperation::from_method(&method))
        .await?;

    let listing = match state.pagination.window(&params) {
        None => Listing::All(state.store.list_posts(None).await?),
        Some(window) => {
            let count = state.store.count_posts().await?;
            let results = state.store.list_posts(Some(window)).await?;
            Listing::Page(state.pagination.page(results, count, window, &uri, &headers))
        }
    };

    Ok(Json(listing))
}

/// POST /posts
pub async fn create_post(
    State(state): State<AppState>,
    vc: Vc,
    payload: Result<ApiJson<PostPayload>, AppError>,
) -> AppResult<impl IntoResponse> {
    state
        .privacy
        .authorize(&vc, EntityType::Post, PrivacyOperation::Create)
        .await?;
    let author = vc.require_user()?;

    let ApiJson(payload) = payload?;
    let fields = payload.into_fields()?;
    ensure_group_exists(&state, fields.group).await?;

    let post = state.store.create_post(author.id, fields).await?;
    tracing::info!(post_id = post.id, author = %author.username, "Post created");
    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /posts/{post_id}
pub async fn get_post(
    State(state): State<AppState>,
    vc: Vc,
    method: Method,
    ApiPath(post_id): ApiPath<PostId>,
) -> AppResult<Json<Post>> {
    let post = load_post(&state, post_id).await?;
    state
        .privacy
        .authorize_object(&vc, EntityType::Post, PrivacyOperation::from_method(&method), &post)
        .await?;
    Ok(Json(post))
}

/// PUT replaces the writable fields, PATCH merges the ones sent
pub async fn update_post(
    State(state): State<AppState>,
    vc: Vc,
    method: Method,
    ApiPath(post_id): ApiPath<PostId>,
    payload: Result<ApiJson<PostPayload>, AppError>,
) -> AppResult<Json<Post>> {
    vc.require_user()?;
    let post = load_post(&state, post_id).await?;
    state
        .privacy
        .authorize_object(&vc, EntityType::Post, PrivacyOperation::Update, &post)
        .await?;

    let ApiJson(payload) = payload?;
    let fields = if method == Method::PATCH {
        payload.merge_into(&post)?
    } else {
        payload.into_fields()?
    };
    ensure_group_exists(&state, fields.group).await?;

    let updated = state
        .store
        .update_post(post_id, fields)
        .await?
        .ok_or_else(|| AppError::NotFound("No Post matches the given query.".to_string()))?;
    tracing::info!(post_id, "Post updated");
    Ok(Json(updated))
}

/// DELETE /posts/{post_id} - comments go with it
pub async fn delete_post(
    State(state): State<AppState>,
    vc: Vc,
    ApiPath(post_id): ApiPath<PostId>,
) -> AppResult<StatusCode> {
    vc.require_user()?;
    let post = load_post(&state, post_id).await?;
    state
        .privacy
        .authorize_object(&vc, EntityType::Post, PrivacyOperation::Delete, &post)
        .await?;

    state.store.delete_post(post_id).await?;
    tracing::info!(post_id, "Post deleted");
    Ok(StatusCode::NO_CONTENT)
}

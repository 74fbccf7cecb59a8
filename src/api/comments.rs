use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::IntoResponse,
    Json,
};

use super::{
    extract::{ApiJson, ApiPath},
    posts::load_post,
};
use crate::{
    app_state::AppState,
    ent_framework::PrivacyOperation,
    error::{AppError, AppResult},
    infrastructure::middleware::Vc,
    models::{comment::CommentPayload, Comment, CommentId, EntityType, PostId},
};

async fn load_comment(state: &AppState, post_id: PostId, comment_id: CommentId) -> AppResult<Comment> {
    state
        .store
        .get_comment(post_id, comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No Comment matches the given query.".to_string()))
}

pub async fn list_comments(
    State(state): State<AppState>,
    vc: Vc,
    method: Method,
    ApiPath(post_id): ApiPath<PostId>,
) -> AppResult<Json<Vec<Comment>>> {
    state
        .privacy
        .authorize(&vc, EntityType::Comment, PrivacyOperation::from_method(&method))
        .await?;
    load_post(&state, post_id).await?;

    Ok(Json(state.store.list_comments(post_id).await?))
}

pub async fn create_comment(
    State(state): State<AppState>,
    vc: Vc,
    ApiPath(post_id): ApiPath<PostId>,
    payload: Result<ApiJson<CommentPayload>, AppError>,
) -> AppResult<impl IntoResponse> {
    state
        .privacy
        .authorize(&vc, EntityType::Comment, PrivacyOperation::Create)
        .await?;
    let author = vc.require_user()?;
    load_post(&state, post_id).await?;

    let ApiJson(payload) = payload?;
    let text = payload.into_text()?;

    let comment = state.store.create_comment(author.id, post_id, &text).await?;
    tracing::info!(post_id, comment_id = comment.id, author = %author.username, "Comment created");
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn get_comment(
    State(state): State<AppState>,
    vc: Vc,
    method: Method,
    ApiPath((post_id, comment_id)): ApiPath<(PostId, CommentId)>,
) -> AppResult<Json<Comment>> {
    let comment = load_comment(&state, post_id, comment_id).await?;
    state
        .privacy
        .authorize_object(&vc, EntityType::Comment, PrivacyOperation::from_method(&method), &comment)
        .await?;
    Ok(Json(comment))
}

pub async fn update_comment(
    State(state): State<AppState>,
    vc: Vc,
    method: Method,
    ApiPath((post_id, comment_id)): ApiPath<(PostId, CommentId)>,
    payload: Result<ApiJson<CommentPayload>, AppError>,
) -> AppResult<Json<Comment>> {
    vc.require_user()?;
    let comment = load_comment(&state, post_id, comment_id).await?;
    state
        .privacy
        .authorize_object(&vc, EntityType::Comment, PrivacyOperation::Update, &comment)
        .await?;

    let ApiJson(payload) = payload?;
    let text = if method == Method::PATCH {
        payload.merge_into(&comment)?
    } else {
        payload.into_text()?
    };

    let updated = state
        .store
        .update_comment(comment_id, &text)
        .await?
        .ok_or_else(|| AppError::NotFound("No Comment matches the given query.".to_string()))?;
    tracing::info!(post_id, comment_id, "Comment updated");
    Ok(Json(updated))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    vc: Vc,
    ApiPath((post_id, comment_id)): ApiPath<(PostId, CommentId)>,
) -> AppResult<StatusCode> {
    vc.require_user()?;
    let comment = load_comment(&state, post_id, comment_id).await?;
    state
        .privacy
        .authorize_object(&vc, EntityType::Comment, PrivacyOperation::Delete, &comment)
        .await?;

    state.store.delete_comment(comment_id).await?;
    tracing::info!(post_id, comment_id, "Comment deleted");
    Ok(StatusCode::NO_CONTENT)
}

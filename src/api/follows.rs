use std::collections::HashMap;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::extract::{ApiJson, ApiQuery};
use crate::{
    app_state::AppState,
    ent_framework::PrivacyOperation,
    error::{AppError, AppResult},
    infrastructure::middleware::Vc,
    models::{follow::FollowPayload, EntityType, Follow},
};

const SEARCH_PARAM: &str = "search";

/// GET /follow - the viewer's own follows, optionally filtered with `?search=`
pub async fn list_follows(
    State(state): State<AppState>,
    vc: Vc,
    ApiQuery(params): ApiQuery<HashMap<String, String>>,
) -> AppResult<Json<Vec<Follow>>> {
    state
        .privacy
        .authorize(&vc, EntityType::Follow, PrivacyOperation::Read)
        .await?;
    let user = vc.require_user()?;

    let search = params.get(SEARCH_PARAM).map(String::as_str);
    Ok(Json(state.follows.list(user, search).await?))
}

/// POST /follow with `{"following": "<username>"}`
pub async fn create_follow(
    State(state): State<AppState>,
    vc: Vc,
    payload: Result<ApiJson<FollowPayload>, AppError>,
) -> AppResult<impl IntoResponse> {
    state
        .privacy
        .authorize(&vc, EntityType::Follow, PrivacyOperation::Create)
        .await?;
    let user = vc.require_user()?;

    let ApiJson(payload) = payload?;
    let following = payload
        .following
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| AppError::Validation("following: This field is required.".to_string()))?;

    let follow = state.follows.follow(user, &following).await?;
    Ok((StatusCode::CREATED, Json(follow)))
}

use axum::{extract::State, http::Method, Json};

use super::extract::ApiPath;
use crate::{
    app_state::AppState,
    ent_framework::PrivacyOperation,
    error::{AppError, AppResult},
    infrastructure::middleware::Vc,
    models::{EntityType, Group, GroupId},
};

pub async fn list_groups(
    State(state): State<AppState>,
    vc: Vc,
    method: Method,
) -> AppResult<Json<Vec<Group>>> {
    state
        .privacy
        .authorize(&vc, EntityType::Group, PrivacyOperation::from_method(&method))
        .await?;
    Ok(Json(state.store.list_groups().await?))
}

pub async fn get_group(
    State(state): State<AppState>,
    vc: Vc,
    method: Method,
    ApiPath(group_id): ApiPath<GroupId>,
) -> AppResult<Json<Group>> {
    state
        .privacy
        .authorize(&vc, EntityType::Group, PrivacyOperation::from_method(&method))
        .await?;
    let group = state
        .store
        .get_group(group_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No Group matches the given query.".to_string()))?;
    Ok(Json(group))
}

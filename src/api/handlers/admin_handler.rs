use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::*},
    error::AppError,
    security::auth::Claims,
};

pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    debug!(?params, "Listing users");

    let query = params.to_query()?;
    let page = state.users.list(&query).await?;
    Ok(Json(page.map(UserResponse::from)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(UserResponse::from(state.users.get(&id).await?)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Updating user {} by {}", id, claims.username);

    let user = state.users.update(&claims, &id, request.into()).await?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Deleting user {} by {}", id, claims.username);

    state.users.delete(&claims, &id).await?;
    Ok(Json(DeletedResponse::new(id)))
}

pub async fn dashboard_stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.analytics.dashboard_stats().await?))
}

pub async fn mobile_suit_grades(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.analytics.mobile_suit_grades().await?))
}

pub async fn mobile_suit_series(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.analytics.mobile_suit_series().await?))
}

pub async fn lore_manufacturers(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.analytics.lore_manufacturers().await?))
}

pub async fn character_affiliations(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.analytics.character_affiliations().await?))
}

pub async fn timeline_events(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.analytics.timeline_events().await?))
}

pub async fn content_growth(
    State(state): State<AppState>,
    Query(params): Query<GrowthParams>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Content growth for {} months", params.months);
    Ok(Json(state.analytics.content_growth(params.months).await?))
}

pub async fn get_settings(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.settings.get().await?))
}

pub async fn update_settings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Updating site settings by {}", claims.username);
    Ok(Json(state.settings.update(request.into()).await?))
}

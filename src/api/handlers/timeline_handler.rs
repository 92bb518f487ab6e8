use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::*},
    error::AppError,
};

pub async fn list_timelines(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    debug!(?params, "Listing timelines");

    let query = params.to_query()?;
    Ok(Json(state.timelines.eras().list(&query).await?))
}

pub async fn get_timeline(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Getting timeline: {}", id);
    Ok(Json(state.timelines.eras().get(&id).await?))
}

pub async fn create_timeline(
    State(state): State<AppState>,
    Json(request): Json<CreateTimelineRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Creating timeline: {}", request.name);

    let timeline = state.timelines.create(request.into_document()?).await?;
    Ok((StatusCode::CREATED, Json(timeline)))
}

pub async fn update_timeline(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateTimelineRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Updating timeline: {}", id);

    let timeline = state
        .timelines
        .eras()
        .update(&id, move |t| request.apply_to(t).map_err(AppError::from))
        .await?;
    Ok(Json(timeline))
}

pub async fn delete_timeline(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Deleting timeline: {}", id);

    state.timelines.eras().delete(&id).await?;
    Ok(Json(DeletedResponse::new(id)))
}

pub async fn add_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<EventInput>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Adding event to timeline {}: {}", id, request.title);

    let timeline = state.timelines.add_event(&id, request.into_event()?).await?;
    Ok((StatusCode::CREATED, Json(timeline)))
}

pub async fn update_event(
    State(state): State<AppState>,
    Path((id, event_id)): Path<(String, String)>,
    Json(request): Json<UpdateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Updating event {} in timeline {}", event_id, id);

    let timeline = state
        .timelines
        .update_event(&id, &event_id, request.into_changes()?)
        .await?;
    Ok(Json(timeline))
}

pub async fn remove_event(
    State(state): State<AppState>,
    Path((id, event_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Removing event {} from timeline {}", event_id, id);

    let timeline = state.timelines.remove_event(&id, &event_id).await?;
    Ok(Json(timeline))
}

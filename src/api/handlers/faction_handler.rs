use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::*, handlers::image_handler::upload_image},
    error::AppError,
};

pub async fn list_factions(
    State(state): State<AppState>,
    Query(params): Query<FactionParams>,
) -> Result<impl IntoResponse, AppError> {
    debug!(?params, "Listing factions");

    let query = params.to_query()?;
    Ok(Json(state.factions.list(&query).await?))
}

pub async fn get_faction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Getting faction: {}", id);
    Ok(Json(state.factions.get(&id).await?))
}

pub async fn create_faction(
    State(state): State<AppState>,
    Json(request): Json<CreateFactionRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Creating faction: {}", request.name);

    let faction = state.factions.create(request.into_document()?).await?;
    Ok((StatusCode::CREATED, Json(faction)))
}

pub async fn update_faction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateFactionRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Updating faction: {}", id);

    let faction = state
        .factions
        .update(&id, move |f| request.apply_to(f).map_err(AppError::from))
        .await?;
    Ok(Json(faction))
}

pub async fn delete_faction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Deleting faction: {}", id);

    state.factions.delete(&id).await?;
    Ok(Json(DeletedResponse::new(id)))
}

pub async fn upload_faction_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let response = upload_image(&state.factions, &state.images, &id, multipart).await?;
    Ok(Json(response))
}

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

pub async fn list_lore(
    State(state): State<AppState>,
    Query(params): Query<LoreParams>,
) -> Result<impl IntoResponse, AppError> {
    debug!(?params, "Listing lore mobile suits");

    let query = params.to_query()?;
    Ok(Json(state.lore.list(&query).await?))
}

pub async fn get_lore(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Getting lore mobile suit: {}", id);
    Ok(Json(state.lore.get(&id).await?))
}

pub async fn create_lore(
    State(state): State<AppState>,
    Json(request): Json<CreateLoreMobileSuitRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Creating lore mobile suit: {}", request.url);

    let suit = state.lore.create(request.into_document()?).await?;
    Ok((StatusCode::CREATED, Json(suit)))
}

pub async fn update_lore(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateLoreMobileSuitRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Updating lore mobile suit: {}", id);

    let suit = state
        .lore
        .update(&id, move |suit| request.apply_to(suit).map_err(AppError::from))
        .await?;
    Ok(Json(suit))
}

pub async fn delete_lore(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Deleting lore mobile suit: {}", id);

    state.lore.delete(&id).await?;
    Ok(Json(DeletedResponse::new(id)))
}

pub async fn upload_lore_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let response = upload_image(&state.lore, &state.images, &id, multipart).await?;
    Ok(Json(response))
}

pub async fn list_characters(
    State(state): State<AppState>,
    Query(params): Query<CharacterParams>,
) -> Result<impl IntoResponse, AppError> {
    debug!(?params, "Listing characters");

    let query = params.to_query()?;
    Ok(Json(state.characters.list(&query).await?))
}

pub async fn get_character(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Getting character: {}", id);
    Ok(Json(state.characters.get(&id).await?))
}

pub async fn create_character(
    State(state): State<AppState>,
    Json(request): Json<CreateCharacterRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Creating character: {}", request.name);

    let character = state.characters.create(request.into_document()?).await?;
    Ok((StatusCode::CREATED, Json(character)))
}

pub async fn update_character(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateCharacterRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Updating character: {}", id);

    let character = state
        .characters
        .update(&id, move |c| request.apply_to(c).map_err(AppError::from))
        .await?;
    Ok(Json(character))
}

pub async fn delete_character(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Deleting character: {}", id);

    state.characters.delete(&id).await?;
    Ok(Json(DeletedResponse::new(id)))
}

pub async fn upload_character_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let response = upload_image(&state.characters, &state.images, &id, multipart).await?;
    Ok(Json(response))
}

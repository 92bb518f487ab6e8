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

pub async fn list_mobile_suits(
    State(state): State<AppState>,
    Query(params): Query<MobileSuitParams>,
) -> Result<impl IntoResponse, AppError> {
    debug!(?params, "Listing mobile suits");

    let query = params.to_query()?;
    Ok(Json(state.mobile_suits.list(&query).await?))
}

pub async fn get_mobile_suit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Getting mobile suit: {}", id);
    Ok(Json(state.mobile_suits.get(&id).await?))
}

pub async fn create_mobile_suit(
    State(state): State<AppState>,
    Json(request): Json<CreateMobileSuitRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Creating mobile suit: {}", request.name);

    let suit = state.mobile_suits.create(request.into_document()?).await?;
    Ok((StatusCode::CREATED, Json(suit)))
}

pub async fn update_mobile_suit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateMobileSuitRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Updating mobile suit: {}", id);

    let suit = state
        .mobile_suits
        .update(&id, move |suit| request.apply_to(suit).map_err(AppError::from))
        .await?;
    Ok(Json(suit))
}

pub async fn delete_mobile_suit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Deleting mobile suit: {}", id);

    state.mobile_suits.delete(&id).await?;
    Ok(Json(DeletedResponse::new(id)))
}

pub async fn upload_mobile_suit_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let response = upload_image(&state.mobile_suits, &state.images, &id, multipart).await?;
    Ok(Json(response))
}

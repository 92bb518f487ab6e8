use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::*},
    error::AppError,
    security::auth::Claims,
};

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Registering user: {}", request.username);

    let session = state.auth.register(request.into()).await?;
    Ok((StatusCode::CREATED, Json(AuthResponse::from(session))))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Login attempt: {}", request.login);

    let session = state.auth.login(&request.login, &request.password).await?;
    Ok(Json(AuthResponse::from(session)))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth.me(&claims).await?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn refresh(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Refreshing token for {}", claims.username);

    let session = state.auth.refresh(&claims).await?;
    Ok(Json(AuthResponse::from(session)))
}

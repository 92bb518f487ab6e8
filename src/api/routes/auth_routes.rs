//! Auth Routes
//!
//! 注册、登录（限流）与需要令牌的当前用户接口。

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::api::app_state::AppState;
use crate::api::handlers::auth_handler::*;
use crate::security::middleware::{auth_rate_limit, require_auth};

pub fn create_auth_router(state: AppState) -> Router<AppState> {
    let credentials = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_rate_limit));

    let session = Router::new()
        .route("/auth/me", get(me))
        .route("/auth/refresh", post(refresh))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    credentials.merge(session)
}

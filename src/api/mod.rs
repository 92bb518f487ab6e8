//! API 模块
//!
//! 提供 REST API 支持。

#[cfg(test)]
mod api_tests;
pub mod app_state;
pub mod dto;
pub mod handlers;
pub mod routes;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;

use crate::api::app_state::AppState;
use crate::config::config::ServerConfig;
use crate::observability::{ObservabilityState, create_observability_router, metrics_middleware};
use crate::security::middleware::{error_request_id_middleware, security_headers_middleware};

/// `/api/v1` 下的全部路由
pub fn create_api_router(app_state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::content_routes::create_public_content_router())
        .merge(routes::auth_routes::create_auth_router(app_state.clone()))
        .merge(routes::admin_routes::create_admin_router(app_state.clone()));

    Router::new()
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(app_state.config.server.max_request_size))
        .with_state(app_state)
}

/// 完整的应用路由：API、上传文件、可观测性端点与公共中间件
pub fn create_router(app_state: AppState, observability: Arc<ObservabilityState>) -> Router {
    let upload = &app_state.config.upload;
    let uploads_path = format!("/{}", upload.public_path.trim_matches('/'));
    let uploads = ServeDir::new(&upload.dir);
    let cors = cors_layer(&app_state.config.server);
    let metrics = app_state.metrics.clone();

    create_observability_router(observability)
        .merge(create_api_router(app_state))
        .nest_service(&uploads_path, uploads)
        .layer(middleware::from_fn_with_state(metrics, metrics_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(error_request_id_middleware))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    if config.cors_allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(origins)
}

//! Admin Routes
//!
//! 后台接口：内容写入、用户管理、统计与站点设置，全部要求管理员令牌。

use axum::{
    Router, middleware,
    routing::{delete, get, put},
};

use crate::api::app_state::AppState;
use crate::api::handlers::admin_handler::*;
use crate::api::routes::content_routes::create_content_admin_router;
use crate::security::middleware::require_admin;

pub fn create_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(create_content_admin_router())
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user))
        .route("/users/:id", put(update_user))
        .route("/users/:id", delete(delete_user))
        .route("/dashboard/stats", get(dashboard_stats))
        .route("/analytics/mobile-suits/grades", get(mobile_suit_grades))
        .route("/analytics/mobile-suits/series", get(mobile_suit_series))
        .route("/analytics/lore/manufacturers", get(lore_manufacturers))
        .route("/analytics/characters/affiliations", get(character_affiliations))
        .route("/analytics/timeline", get(timeline_events))
        .route("/analytics/content-growth", get(content_growth))
        .route("/settings", put(update_settings))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

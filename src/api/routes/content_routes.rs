//! Content Routes
//!
//! 内容集合的公开读取路由与后台写入路由。

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::api::app_state::AppState;
use crate::api::handlers::*;

/// 公开读取
pub fn create_public_content_router() -> Router<AppState> {
    Router::new()
        .route("/mobile-suits", get(list_mobile_suits))
        .route("/mobile-suits/:id", get(get_mobile_suit))
        .route("/lore", get(list_lore))
        .route("/lore/:id", get(get_lore))
        .route("/lore-characters", get(list_characters))
        .route("/lore-characters/:id", get(get_character))
        .route("/factions", get(list_factions))
        .route("/factions/:id", get(get_faction))
        .route("/timeline", get(list_timelines))
        .route("/timeline/:id", get(get_timeline))
        .route("/settings", get(get_settings))
}

/// 后台写入，调用方负责挂上管理员中间件
pub fn create_content_admin_router() -> Router<AppState> {
    Router::new()
        .route("/mobile-suits", post(create_mobile_suit))
        .route("/mobile-suits/:id", put(update_mobile_suit))
        .route("/mobile-suits/:id", delete(delete_mobile_suit))
        .route("/mobile-suits/:id/image", post(upload_mobile_suit_image))
        .route("/lore", post(create_lore))
        .route("/lore/:id", put(update_lore))
        .route("/lore/:id", delete(delete_lore))
        .route("/lore/:id/image", post(upload_lore_image))
        .route("/lore-characters", post(create_character))
        .route("/lore-characters/:id", put(update_character))
        .route("/lore-characters/:id", delete(delete_character))
        .route("/lore-characters/:id/image", post(upload_character_image))
        .route("/factions", post(create_faction))
        .route("/factions/:id", put(update_faction))
        .route("/factions/:id", delete(delete_faction))
        .route("/factions/:id/image", post(upload_faction_image))
        .route("/timeline", post(create_timeline))
        .route("/timeline/:id", put(update_timeline))
        .route("/timeline/:id", delete(delete_timeline))
        .route("/timeline/:id/events", post(add_event))
        .route("/timeline/:id/events/:event_id", put(update_event))
        .route("/timeline/:id/events/:event_id", delete(remove_event))
}

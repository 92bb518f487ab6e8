//! Routes 模块
//!
//! 定义 API 路由。

pub mod admin_routes;
pub mod auth_routes;
pub mod content_routes;

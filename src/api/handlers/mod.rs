//! Handlers 模块
//!
//! HTTP 请求处理程序。

pub mod admin_handler;
pub mod auth_handler;
pub mod faction_handler;
pub mod image_handler;
pub mod lore_handler;
pub mod mobile_suit_handler;
pub mod timeline_handler;

pub use admin_handler::*;
pub use auth_handler::*;
pub use faction_handler::*;
pub use lore_handler::*;
pub use mobile_suit_handler::*;
pub use timeline_handler::*;

//! DTO 模块
//!
//! 数据传输对象，用于 API 请求和响应的序列化。

pub mod admin_dto;
pub mod auth_dto;
pub mod common_dto;
pub mod faction_dto;
pub mod lore_dto;
pub mod mobile_suit_dto;
pub mod timeline_dto;

pub use admin_dto::*;
pub use auth_dto::*;
pub use common_dto::*;
pub use faction_dto::*;
pub use lore_dto::*;
pub use mobile_suit_dto::*;
pub use timeline_dto::*;

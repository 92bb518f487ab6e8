//! Gundam Codex - 高达百科后端
//!
//! 提供模型商品、百科机体、人物、势力与时间线的 REST API，
//! 以及从第三方 wiki / 商品站点采集数据的脚本。

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod scraper;
pub mod security;
pub mod services;
pub mod storage;

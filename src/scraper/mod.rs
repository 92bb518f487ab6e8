//! 数据采集模块
//!
//! 从 gundam.fandom.com、gunpladb.net 与 mechabay.com 抓取页面，解析为文档并写入存储。
//! 请求严格串行，两次请求之间保持固定间隔。

pub mod clean;
pub mod client;
pub mod fandom;
pub mod gunpladb;
pub mod html;
pub mod importer;
pub mod mechabay;
pub mod runner;

pub use client::FetchClient;
pub use importer::{ImportMode, ImportOutcome, ImportReport, Importer};
pub use runner::ScrapeRunner;

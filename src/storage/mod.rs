//! 存储层模块
//!
//! 文档仓储抽象与实现：SurrealDB（持久化）和内存（测试 / 本地开发）。

pub mod factory;
pub mod memory;
pub mod repository;
pub mod surrealdb;

pub use factory::{Repositories, StorageFactory};
pub use memory::MemoryRepository;
pub use repository::{Document, GroupCount, HasImage, ListQuery, Page, Pagination, Repository};
pub use surrealdb::{SurrealPool, SurrealRepository};

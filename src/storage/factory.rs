//! 存储工厂模块
//!
//! 根据配置创建各集合的仓储实例。

use std::sync::Arc;
use tracing::info;

use crate::config::config::{DatabaseConfig, StorageBackend};
use crate::error::{AppError, Result};
use crate::models::{
    Faction, LoreCharacter, LoreMobileSuit, MobileSuit, SiteSettings, Timeline, User,
};
use crate::storage::memory::MemoryRepository;
use crate::storage::repository::{Document, Repository};
use crate::storage::surrealdb::{SurrealPool, SurrealRepository};

/// 全部集合的仓储
#[derive(Clone)]
pub struct Repositories {
    pub mobile_suits: Arc<dyn Repository<MobileSuit>>,
    pub lore: Arc<dyn Repository<LoreMobileSuit>>,
    pub characters: Arc<dyn Repository<LoreCharacter>>,
    pub factions: Arc<dyn Repository<Faction>>,
    pub timelines: Arc<dyn Repository<Timeline>>,
    pub users: Arc<dyn Repository<User>>,
    pub settings: Arc<dyn Repository<SiteSettings>>,
    backend: StorageBackend,
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories")
            .field("backend", &self.backend)
            .finish()
    }
}

impl Repositories {
    /// 内存仓储
    pub fn in_memory() -> Self {
        Self {
            mobile_suits: memory::<MobileSuit>(),
            lore: memory::<LoreMobileSuit>(),
            characters: memory::<LoreCharacter>(),
            factions: memory::<Faction>(),
            timelines: memory::<Timeline>(),
            users: memory::<User>(),
            settings: memory::<SiteSettings>(),
            backend: StorageBackend::Memory,
        }
    }

    /// SurrealDB 仓储，共用一个连接
    pub fn surreal(pool: SurrealPool) -> Self {
        Self {
            mobile_suits: surreal::<MobileSuit>(&pool),
            lore: surreal::<LoreMobileSuit>(&pool),
            characters: surreal::<LoreCharacter>(&pool),
            factions: surreal::<Faction>(&pool),
            timelines: surreal::<Timeline>(&pool),
            users: surreal::<User>(&pool),
            settings: surreal::<SiteSettings>(&pool),
            backend: StorageBackend::Surrealdb,
        }
    }

    pub fn backend(&self) -> StorageBackend {
        self.backend
    }

    /// 检查存储是否可用
    pub async fn health_check(&self) -> Result<()> {
        self.settings.health_check().await
    }
}

fn memory<T: Document>() -> Arc<dyn Repository<T>> {
    Arc::new(MemoryRepository::<T>::new())
}

fn surreal<T: Document>(pool: &SurrealPool) -> Arc<dyn Repository<T>> {
    Arc::new(SurrealRepository::<T>::new(pool.clone()))
}

/// 存储工厂
pub struct StorageFactory;

impl StorageFactory {
    /// 根据配置创建存储实例
    pub async fn create(config: &DatabaseConfig) -> Result<Repositories> {
        match config.backend {
            StorageBackend::Surrealdb => {
                let connect = SurrealPool::new(config.clone());
                let pool = tokio::time::timeout(
                    std::time::Duration::from_secs(config.connection_timeout.max(1)),
                    connect,
                )
                .await
                .map_err(|_| {
                    AppError::Connection(format!("连接 SurrealDB 超时: {}", config.url))
                })?
                .map_err(|e| AppError::Connection(e.to_string()))?;

                Ok(Repositories::surreal(pool))
            }
            StorageBackend::Memory => {
                info!("使用内存存储，数据不会持久化");
                Ok(Repositories::in_memory())
            }
        }
    }
}

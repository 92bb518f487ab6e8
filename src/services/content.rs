//! 内容服务
//!
//! 各内容集合通用的 CRUD，带读穿缓存与业务唯一键检查。

use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::ReadThrough;
use crate::error::{AppError, Result};
use crate::storage::repository::{Document, HasImage, ListQuery, Page, Repository};

/// 内容集合服务
pub struct ContentService<T: Document> {
    repository: Arc<dyn Repository<T>>,
    cache: ReadThrough,
}

impl<T: Document> Clone for ContentService<T> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<T: Document> ContentService<T> {
    pub fn new(repository: Arc<dyn Repository<T>>, cache: ReadThrough) -> Self {
        Self { repository, cache }
    }

    pub fn repository(&self) -> &Arc<dyn Repository<T>> {
        &self.repository
    }

    /// 分页列表
    pub async fn list(&self, query: &ListQuery) -> Result<Page<T>> {
        let key = self.cache.keys().list(T::COLLECTION, &query.fingerprint());
        if let Some(page) = self.cache.get_json::<Page<T>>(T::COLLECTION, &key).await {
            return Ok(page);
        }

        let generation = self.cache.generation(T::COLLECTION);
        let items = self.repository.list(query).await?;
        let total = self.repository.count(query).await?;
        let page = Page::new(items, total, query.pagination);

        self.cache.put_json(T::COLLECTION, generation, &key, &page).await;
        Ok(page)
    }

    pub async fn find(&self, id: &str) -> Result<Option<T>> {
        let key = self.cache.keys().item(T::COLLECTION, id);
        if let Some(doc) = self.cache.get_json::<T>(T::COLLECTION, &key).await {
            return Ok(Some(doc));
        }

        let generation = self.cache.generation(T::COLLECTION);
        let doc = self.repository.get_by_id(id).await?;
        if let Some(doc) = &doc {
            self.cache.put_json(T::COLLECTION, generation, &key, doc).await;
        }
        Ok(doc)
    }

    /// 获取文档，不存在时返回 NotFound
    pub async fn get(&self, id: &str) -> Result<T> {
        self.find(id).await?.ok_or_else(|| not_found::<T>(id))
    }

    pub async fn find_by_natural_key(&self, key: &str) -> Result<Option<T>> {
        self.repository.find_by_field(T::NATURAL_KEY, key).await
    }

    pub async fn count_all(&self) -> Result<u64> {
        self.repository.count(&ListQuery::default()).await
    }

    /// 创建文档，业务唯一键重复时返回 Conflict
    pub async fn create(&self, doc: T) -> Result<T> {
        self.ensure_unique(&doc).await?;

        let created = self.repository.create(&doc).await?;
        self.cache.invalidate_collection(T::COLLECTION).await;

        info!(
            collection = T::COLLECTION,
            id = created.id(),
            key = %created.natural_key(),
            "文档已创建"
        );
        Ok(created)
    }

    /// 局部更新：读取当前文档，交给 `apply` 修改后整体写回
    pub async fn update<F>(&self, id: &str, apply: F) -> Result<T>
    where
        F: FnOnce(&mut T) -> Result<()> + Send,
    {
        let mut doc = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found::<T>(id))?;

        let original_key = doc.natural_key();
        apply(&mut doc)?;
        if doc.natural_key() != original_key {
            self.ensure_unique(&doc).await?;
        }

        self.save(doc).await
    }

    /// 整体覆盖已有文档（保留 id）
    pub async fn save(&self, mut doc: T) -> Result<T> {
        doc.touch();
        let id = doc.id().to_string();

        let updated = self
            .repository
            .update(&id, &doc)
            .await?
            .ok_or_else(|| not_found::<T>(&id))?;
        self.cache.invalidate_collection(T::COLLECTION).await;

        debug!(collection = T::COLLECTION, id = %id, "文档已更新");
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.repository.delete(id).await? {
            return Err(not_found::<T>(id));
        }
        self.cache.invalidate_collection(T::COLLECTION).await;

        info!(collection = T::COLLECTION, id, "文档已删除");
        Ok(())
    }

    async fn ensure_unique(&self, doc: &T) -> Result<()> {
        let key = doc.natural_key();
        if key.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "{} 不能为空",
                T::NATURAL_KEY
            )));
        }

        match self.find_by_natural_key(&key).await? {
            Some(existing) if existing.id() != doc.id() => Err(AppError::Conflict(format!(
                "{} {}={} 已存在",
                T::COLLECTION,
                T::NATURAL_KEY,
                key
            ))),
            _ => Ok(()),
        }
    }
}

impl<T: HasImage> ContentService<T> {
    /// 设置封面图地址
    pub async fn set_image_url(&self, id: &str, url: Option<String>) -> Result<T> {
        self.update(id, move |doc| {
            doc.set_image_url(url);
            Ok(())
        })
        .await
    }
}

fn not_found<T: Document>(id: &str) -> AppError {
    AppError::NotFound(format!("{} {}", T::COLLECTION, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCache, ReadThrough};
    use crate::config::AppConfig;
    use crate::models::Faction;
    use crate::storage::memory::MemoryRepository;
    use crate::storage::repository::Pagination;

    fn service() -> (ContentService<Faction>, MemoryCache) {
        let cache = MemoryCache::new();
        let read_through = ReadThrough::new(Arc::new(cache.clone()), &AppConfig::testing().cache);
        (
            ContentService::new(Arc::new(MemoryRepository::<Faction>::new()), read_through),
            cache,
        )
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_natural_key() {
        let (service, _) = service();
        service.create(Faction::new("Titans")).await.unwrap();

        let result = service.create(Faction::new("Titans")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let (service, _) = service();
        let mut aeug = Faction::new("AEUG");
        aeug.era = "Universal Century".into();
        aeug.leaders = vec!["Blex Forer".into()];
        let created = service.create(aeug).await.unwrap();

        let updated = service
            .update(&created.id, |f| {
                f.headquarters = Some("Granada".into());
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(updated.era, "Universal Century");
        assert_eq!(updated.leaders, vec!["Blex Forer".to_string()]);
        assert_eq!(updated.headquarters.as_deref(), Some("Granada"));
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_rename_into_existing_key_conflicts() {
        let (service, _) = service();
        service.create(Faction::new("Zeon")).await.unwrap();
        let neo = service.create(Faction::new("Neo Zeon")).await.unwrap();

        let result = service
            .update(&neo.id, |f| {
                f.name = "Zeon".into();
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_writes_invalidate_cached_lists() {
        let (service, cache) = service();
        let query = ListQuery::new(Pagination::new(1, 10));

        service.create(Faction::new("Celestial Being")).await.unwrap();
        assert_eq!(service.list(&query).await.unwrap().total, 1);
        assert!(!cache.is_empty());

        service.create(Faction::new("A-Laws")).await.unwrap();
        assert_eq!(service.list(&query).await.unwrap().total, 2);
    }

    #[tokio::test]
    async fn test_get_and_delete_missing() {
        let (service, _) = service();
        assert!(matches!(service.get("nope").await, Err(AppError::NotFound(_))));
        assert!(matches!(service.delete("nope").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_set_image_url() {
        let (service, _) = service();
        let created = service.create(Faction::new("Gjallarhorn")).await.unwrap();
        let updated = service
            .set_image_url(&created.id, Some("/uploads/faction/x.png".into()))
            .await
            .unwrap();
        assert_eq!(updated.image_url.as_deref(), Some("/uploads/faction/x.png"));

        // cached item is refreshed after the write
        let fetched = service.get(&created.id).await.unwrap();
        assert_eq!(fetched.image_url.as_deref(), Some("/uploads/faction/x.png"));
    }
}

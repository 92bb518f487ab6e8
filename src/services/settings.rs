//! 站点设置服务

use std::sync::Arc;
use tracing::info;

use crate::cache::ReadThrough;
use crate::error::{AppError, Result};
use crate::models::SiteSettings;
use crate::models::settings::SITE_SETTINGS_ID;
use crate::storage::repository::{Document, MAX_PAGE_SIZE, Repository};

/// 可修改的设置项
#[derive(Debug, Clone, Default)]
pub struct SettingsChanges {
    pub site_name: Option<String>,
    pub tagline: Option<String>,
    pub items_per_page: Option<usize>,
    pub featured_mobile_suit_ids: Option<Vec<String>>,
    pub maintenance_mode: Option<bool>,
}

#[derive(Clone)]
pub struct SettingsService {
    repository: Arc<dyn Repository<SiteSettings>>,
    cache: ReadThrough,
}

impl SettingsService {
    pub fn new(repository: Arc<dyn Repository<SiteSettings>>, cache: ReadThrough) -> Self {
        Self { repository, cache }
    }

    /// 读取设置，尚未保存过时返回默认值
    pub async fn get(&self) -> Result<SiteSettings> {
        let key = self
            .cache
            .keys()
            .item(SiteSettings::COLLECTION, SITE_SETTINGS_ID);
        if let Some(settings) = self
            .cache
            .get_json::<SiteSettings>(SiteSettings::COLLECTION, &key)
            .await
        {
            return Ok(settings);
        }

        let generation = self.cache.generation(SiteSettings::COLLECTION);
        let settings = self
            .repository
            .get_by_id(SITE_SETTINGS_ID)
            .await?
            .unwrap_or_default();
        self.cache
            .put_json(SiteSettings::COLLECTION, generation, &key, &settings)
            .await;
        Ok(settings)
    }

    pub async fn update(&self, changes: SettingsChanges) -> Result<SiteSettings> {
        let existing = self.repository.get_by_id(SITE_SETTINGS_ID).await?;
        let is_new = existing.is_none();
        let mut settings = existing.unwrap_or_default();

        if let Some(site_name) = changes.site_name {
            let site_name = site_name.trim().to_string();
            if site_name.is_empty() {
                return Err(AppError::Validation("站点名称不能为空".to_string()));
            }
            settings.site_name = site_name;
        }
        if let Some(tagline) = changes.tagline {
            settings.tagline = tagline.trim().to_string();
        }
        if let Some(items_per_page) = changes.items_per_page {
            if items_per_page == 0 || items_per_page > MAX_PAGE_SIZE {
                return Err(AppError::Validation(format!(
                    "items_per_page 必须在 1 到 {} 之间",
                    MAX_PAGE_SIZE
                )));
            }
            settings.items_per_page = items_per_page;
        }
        if let Some(ids) = changes.featured_mobile_suit_ids {
            let mut unique: Vec<String> = Vec::with_capacity(ids.len());
            for id in ids.into_iter().map(|id| id.trim().to_string()) {
                if !id.is_empty() && !unique.contains(&id) {
                    unique.push(id);
                }
            }
            settings.featured_mobile_suit_ids = unique;
        }
        if let Some(maintenance_mode) = changes.maintenance_mode {
            settings.maintenance_mode = maintenance_mode;
        }

        settings.touch();
        let saved = if is_new {
            self.repository.create(&settings).await?
        } else {
            self.repository
                .update(SITE_SETTINGS_ID, &settings)
                .await?
                .ok_or_else(|| AppError::NotFound("site settings".to_string()))?
        };
        self.cache
            .invalidate_collection(SiteSettings::COLLECTION)
            .await;

        info!(maintenance_mode = saved.maintenance_mode, "站点设置已更新");
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryRepository;

    fn service() -> SettingsService {
        SettingsService::new(
            Arc::new(MemoryRepository::<SiteSettings>::new()),
            ReadThrough::disabled(),
        )
    }

    #[tokio::test]
    async fn test_defaults_when_absent() {
        let settings = service().get().await.unwrap();
        assert_eq!(settings.id, SITE_SETTINGS_ID);
        assert_eq!(settings.items_per_page, 12);
    }

    #[tokio::test]
    async fn test_update_creates_then_updates() {
        let service = service();
        let saved = service
            .update(SettingsChanges {
                tagline: Some("From the One Year War onward".into()),
                featured_mobile_suit_ids: Some(vec!["a".into(), "a".into(), " ".into(), "b".into()]),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(saved.featured_mobile_suit_ids, vec!["a", "b"]);

        let saved = service
            .update(SettingsChanges {
                maintenance_mode: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(saved.maintenance_mode);
        assert_eq!(saved.tagline, "From the One Year War onward");
        assert_eq!(service.get().await.unwrap(), saved);
    }

    #[tokio::test]
    async fn test_rejects_invalid_values() {
        let service = service();
        let result = service
            .update(SettingsChanges {
                items_per_page: Some(0),
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}

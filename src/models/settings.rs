use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::repository::Document;

/// 站点设置文档的固定 ID
pub const SITE_SETTINGS_ID: &str = "site";

/// 站点设置（单例文档）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SiteSettings {
    pub id: String,
    pub site_name: String,
    pub tagline: String,
    /// 公共列表的默认每页条数
    pub items_per_page: usize,
    /// 首页推荐的模型商品
    pub featured_mobile_suit_ids: Vec<String>,
    /// 维护模式下公共站点显示维护提示
    pub maintenance_mode: bool,
    pub updated_at: DateTime<Utc>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            id: SITE_SETTINGS_ID.to_string(),
            site_name: "Gundam Codex".to_string(),
            tagline: "An encyclopedia of the Gundam universe".to_string(),
            items_per_page: 12,
            featured_mobile_suit_ids: Vec::new(),
            maintenance_mode: false,
            updated_at: Utc::now(),
        }
    }
}

impl Document for SiteSettings {
    const COLLECTION: &'static str = "site_settings";
    const NATURAL_KEY: &'static str = "id";
    const SEARCH_FIELDS: &'static [&'static str] = &["site_name"];
    const SORT_FIELD: &'static str = "site_name";

    fn id(&self) -> &str {
        &self.id
    }

    fn natural_key(&self) -> String {
        self.id.clone()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn set_identity(&mut self, id: &str, _created_at: DateTime<Utc>) {
        self.id = id.to_string();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::common::{ArmamentGroup, SpecTable};
use crate::storage::repository::{Document, HasImage};

/// 百科中的机体条目
///
/// 与模型商品 [`MobileSuit`](crate::models::mobile_suit::MobileSuit) 分开存储，
/// 以百科页面 URL 作为业务唯一键。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoreMobileSuit {
    pub id: String,
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub model_number: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub faction: Option<String>,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub pilots: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub specs: SpecTable,
    #[serde(default)]
    pub armaments: Vec<ArmamentGroup>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoreMobileSuit {
    pub fn new(url: &str, name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            url: url.trim().to_string(),
            name: name.trim().to_string(),
            model_number: None,
            manufacturer: None,
            faction: None,
            series: None,
            pilots: Vec::new(),
            description: String::new(),
            specs: SpecTable::new(),
            armaments: Vec::new(),
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 所有分组中的武装数量
    pub fn armament_count(&self) -> usize {
        self.armaments.iter().map(|g| g.items.len()).sum()
    }
}

impl Document for LoreMobileSuit {
    const COLLECTION: &'static str = "lore_mobile_suit";
    const NATURAL_KEY: &'static str = "url";
    const SEARCH_FIELDS: &'static [&'static str] =
        &["name", "model_number", "manufacturer", "faction"];
    const SORT_FIELD: &'static str = "name";

    fn id(&self) -> &str {
        &self.id
    }

    fn natural_key(&self) -> String {
        self.url.clone()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn set_identity(&mut self, id: &str, created_at: DateTime<Utc>) {
        self.id = id.to_string();
        self.created_at = created_at;
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl HasImage for LoreMobileSuit {
    fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    fn set_image_url(&mut self, url: Option<String>) {
        self.image_url = url;
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::common::SpecTable;
use crate::storage::repository::{Document, HasImage};

/// 人物（驾驶员）条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoreCharacter {
    pub id: String,
    /// 百科页面 URL，业务唯一键
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub affiliation: Option<String>,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub description: String,
    /// 自由格式的人物资料（性别、年龄、国籍……）
    #[serde(default)]
    pub profile: SpecTable,
    /// 驾驶过的机体名称
    #[serde(default)]
    pub mobile_suits: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoreCharacter {
    pub fn new(url: &str, name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            url: url.trim().to_string(),
            name: name.trim().to_string(),
            affiliation: None,
            rank: None,
            description: String::new(),
            profile: SpecTable::new(),
            mobile_suits: Vec::new(),
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Document for LoreCharacter {
    const COLLECTION: &'static str = "lore_character";
    const NATURAL_KEY: &'static str = "url";
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "affiliation", "rank"];
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

impl HasImage for LoreCharacter {
    fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    fn set_image_url(&mut self, url: Option<String>) {
        self.image_url = url;
    }
}

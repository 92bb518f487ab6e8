use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::repository::{Document, HasImage};

/// 军事力量（势力下属的部队）
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Force {
    /// 部队名称
    pub name: String,
    /// 下属小队
    pub teams: Vec<String>,
}

impl Force {
    pub fn new(name: &str, teams: Vec<String>) -> Self {
        Self {
            name: name.trim().to_string(),
            teams,
        }
    }
}

/// 势力
///
/// `name` 是业务唯一键，采集脚本依赖它去重。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faction {
    pub id: String,
    pub name: String,
    /// 所属纪元，例如 "Universal Century"
    #[serde(default)]
    pub era: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub leaders: Vec<String>,
    #[serde(default)]
    pub allies: Vec<String>,
    #[serde(default)]
    pub enemies: Vec<String>,
    #[serde(default)]
    pub headquarters: Option<String>,
    #[serde(default)]
    pub forces: Vec<Force>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// 采集来源页面
    #[serde(default)]
    pub source_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Faction {
    pub fn new(name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            era: String::new(),
            description: String::new(),
            leaders: Vec::new(),
            allies: Vec::new(),
            enemies: Vec::new(),
            headquarters: None,
            forces: Vec::new(),
            image_url: None,
            source_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 所有部队下的小队总数
    pub fn team_count(&self) -> usize {
        self.forces.iter().map(|f| f.teams.len()).sum()
    }
}

impl Document for Faction {
    const COLLECTION: &'static str = "faction";
    const NATURAL_KEY: &'static str = "name";
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "era", "description"];
    const SORT_FIELD: &'static str = "name";

    fn id(&self) -> &str {
        &self.id
    }

    fn natural_key(&self) -> String {
        self.name.clone()
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

impl HasImage for Faction {
    fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    fn set_image_url(&mut self, url: Option<String>) {
        self.image_url = url;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faction_new() {
        let faction = Faction::new("  Earth Federation ");
        assert_eq!(faction.name, "Earth Federation");
        assert_eq!(faction.natural_key(), "Earth Federation");
        assert!(!faction.id.is_empty());
        assert_eq!(faction.created_at, faction.updated_at);
    }

    #[test]
    fn test_team_count() {
        let mut faction = Faction::new("Principality of Zeon");
        faction.forces.push(Force::new(
            "Zeon Space Army",
            vec!["Black Tri-Stars".into(), "Cyclops Team".into()],
        ));
        faction.forces.push(Force::new("Mobile Assault Force", vec!["Char's squad".into()]));
        assert_eq!(faction.team_count(), 3);
    }

    #[test]
    fn test_deserialize_with_missing_optional_fields() {
        let json = serde_json::json!({
            "id": "f1",
            "name": "AEUG",
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        });
        let faction: Faction = serde_json::from_value(json).unwrap();
        assert!(faction.forces.is_empty());
        assert!(faction.image_url.is_none());
    }
}

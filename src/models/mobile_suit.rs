use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::common::{ArmamentGroup, SpecTable};
use crate::storage::repository::{Document, HasImage};

/// 模型等级
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Grade {
    #[serde(rename = "HG")]
    HighGrade,
    #[serde(rename = "RG")]
    RealGrade,
    #[serde(rename = "MG")]
    MasterGrade,
    #[serde(rename = "PG")]
    PerfectGrade,
    #[serde(rename = "SD")]
    SuperDeformed,
    #[serde(rename = "EG")]
    EntryGrade,
    #[serde(rename = "RE100")]
    Reborn100,
    #[serde(rename = "FM")]
    FullMechanics,
    #[default]
    #[serde(rename = "OTHER")]
    Other,
}

impl Grade {
    pub fn code(&self) -> &'static str {
        match self {
            Grade::HighGrade => "HG",
            Grade::RealGrade => "RG",
            Grade::MasterGrade => "MG",
            Grade::PerfectGrade => "PG",
            Grade::SuperDeformed => "SD",
            Grade::EntryGrade => "EG",
            Grade::Reborn100 => "RE100",
            Grade::FullMechanics => "FM",
            Grade::Other => "OTHER",
        }
    }

    /// 从等级代码或全称解析，无法识别时返回 None
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_uppercase();

        match normalized.as_str() {
            "HG" | "HGUC" | "HGCE" | "HGAC" | "HGBF" | "HGIBO" | "HIGHGRADE" => {
                Some(Grade::HighGrade)
            }
            "RG" | "REALGRADE" => Some(Grade::RealGrade),
            "MG" | "MGEX" | "MASTERGRADE" => Some(Grade::MasterGrade),
            "PG" | "PGU" | "PGUNLEASHED" | "PERFECTGRADE" | "PERFECTGRADEUNLEASHED" => Some(Grade::PerfectGrade),
            "SD" | "SDEX" | "SDCS" | "BB" | "SUPERDEFORMED" => Some(Grade::SuperDeformed),
            "EG" | "ENTRYGRADE" => Some(Grade::EntryGrade),
            "RE100" | "RE" | "REBORNONEHUNDRED" => Some(Grade::Reborn100),
            "FM" | "FULLMECHANICS" => Some(Grade::FullMechanics),
            "OTHER" => Some(Grade::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// 模型商品（Gunpla）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MobileSuit {
    pub id: String,
    /// 商品名，业务唯一键
    pub name: String,
    #[serde(default)]
    pub grade: Grade,
    /// 比例，例如 "1/144"
    #[serde(default)]
    pub scale: Option<String>,
    /// 出自作品
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub model_number: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub price_yen: Option<u32>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub specs: SpecTable,
    #[serde(default)]
    pub armaments: Vec<ArmamentGroup>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MobileSuit {
    pub fn new(name: &str, grade: Grade) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            grade,
            scale: None,
            series: None,
            model_number: None,
            release_date: None,
            price_yen: None,
            manufacturer: None,
            description: String::new(),
            specs: SpecTable::new(),
            armaments: Vec::new(),
            image_url: None,
            source_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Document for MobileSuit {
    const COLLECTION: &'static str = "mobile_suit";
    const NATURAL_KEY: &'static str = "name";
    const SEARCH_FIELDS: &'static [&'static str] =
        &["name", "model_number", "series", "description"];
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

impl HasImage for MobileSuit {
    fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    fn set_image_url(&mut self, url: Option<String>) {
        self.image_url = url;
    }
}

//! 模型商品 DTO

use serde::Deserialize;

use crate::api::dto::common_dto::*;
use crate::models::{Grade, MobileSuit};
use crate::security::validation::{Validatable, ValidationError, ValidationResult, validators};
use crate::storage::repository::ListQuery;

/// 单个商品价格上限（日元）
const MAX_PRICE_YEN: i64 = 1_000_000;

fn validate_price(price_yen: Option<u32>) -> ValidationResult<()> {
    match price_yen {
        Some(price) => validators::validate_max("price_yen", i64::from(price), MAX_PRICE_YEN),
        None => Ok(()),
    }
}

fn parse_grade(value: &str) -> ValidationResult<Grade> {
    Grade::parse(value).ok_or_else(|| ValidationError::Custom {
        field: "grade".to_string(),
        message: format!("Unknown grade '{}'", value),
    })
}

/// `GET /mobile-suits` 查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MobileSuitParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub q: Option<String>,
    pub grade: Option<String>,
    pub series: Option<String>,
}

impl MobileSuitParams {
    pub fn to_query(&self) -> ValidationResult<ListQuery> {
        let grade = match self.grade.as_deref().map(str::trim) {
            Some(g) if !g.is_empty() => Some(parse_grade(g)?.code().to_string()),
            _ => None,
        };
        Ok(base_query(self.page, self.limit, self.q.clone())?
            .with_filter("grade", grade)
            .with_filter("series", self.series.clone()))
    }
}

/// 创建模型商品请求
#[derive(Debug, Deserialize)]
pub struct CreateMobileSuitRequest {
    pub name: String,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub scale: Option<String>,
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
    pub specs: Vec<SpecEntryInput>,
    #[serde(default)]
    pub armaments: Vec<ArmamentGroupInput>,
    #[serde(default)]
    pub source_url: Option<String>,
}

impl Validatable for CreateMobileSuitRequest {
    fn validate(&self) -> ValidationResult<()> {
        validators::validate_name("name", &self.name)?;
        validators::validate_description("description", &self.description)?;
        validate_price(self.price_yen)?;
        validators::validate_optional_url("source_url", self.source_url.as_deref())
    }
}

impl CreateMobileSuitRequest {
    pub fn into_document(self) -> ValidationResult<MobileSuit> {
        self.validate()?;
        let grade = match self.grade.as_deref() {
            Some(g) if !g.trim().is_empty() => parse_grade(g)?,
            _ => Grade::default(),
        };

        let mut suit = MobileSuit::new(&self.name, grade);
        suit.scale = self.scale.and_then(optional_text);
        suit.series = self.series.and_then(optional_text);
        suit.model_number = self.model_number.and_then(optional_text);
        suit.release_date = self.release_date.and_then(optional_text);
        suit.price_yen = self.price_yen;
        suit.manufacturer = self.manufacturer.and_then(optional_text);
        suit.description = self.description.trim().to_string();
        suit.specs = to_spec_table(self.specs);
        suit.armaments = to_armaments(self.armaments);
        suit.source_url = self.source_url.and_then(optional_text);
        Ok(suit)
    }
}

/// 局部更新；未出现的字段保持原值，可选文本传空字符串表示清空
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateMobileSuitRequest {
    pub name: Option<String>,
    pub grade: Option<String>,
    pub scale: Option<String>,
    pub series: Option<String>,
    pub model_number: Option<String>,
    pub release_date: Option<String>,
    pub price_yen: Option<u32>,
    pub manufacturer: Option<String>,
    pub description: Option<String>,
    pub specs: Option<Vec<SpecEntryInput>>,
    pub armaments: Option<Vec<ArmamentGroupInput>>,
    pub source_url: Option<String>,
}

impl Validatable for UpdateMobileSuitRequest {
    fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.name {
            validators::validate_name("name", name)?;
        }
        if let Some(description) = &self.description {
            validators::validate_description("description", description)?;
        }
        validate_price(self.price_yen)?;
        validators::validate_optional_url("source_url", self.source_url.as_deref())
    }
}

impl UpdateMobileSuitRequest {
    pub fn apply_to(self, suit: &mut MobileSuit) -> ValidationResult<()> {
        self.validate()?;

        if let Some(name) = self.name {
            suit.name = name.trim().to_string();
        }
        if let Some(grade) = self.grade {
            suit.grade = parse_grade(&grade)?;
        }
        if let Some(scale) = self.scale {
            suit.scale = optional_text(scale);
        }
        if let Some(series) = self.series {
            suit.series = optional_text(series);
        }
        if let Some(model_number) = self.model_number {
            suit.model_number = optional_text(model_number);
        }
        if let Some(release_date) = self.release_date {
            suit.release_date = optional_text(release_date);
        }
        if let Some(price_yen) = self.price_yen {
            suit.price_yen = Some(price_yen);
        }
        if let Some(manufacturer) = self.manufacturer {
            suit.manufacturer = optional_text(manufacturer);
        }
        if let Some(description) = self.description {
            suit.description = description.trim().to_string();
        }
        if let Some(specs) = self.specs {
            suit.specs = to_spec_table(specs);
        }
        if let Some(armaments) = self.armaments {
            suit.armaments = to_armaments(armaments);
        }
        if let Some(source_url) = self.source_url {
            suit.source_url = optional_text(source_url);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_normalize_grade_filter() {
        let params = MobileSuitParams {
            grade: Some("Master Grade".into()),
            series: Some("Mobile Suit Gundam".into()),
            ..Default::default()
        };
        let query = params.to_query().unwrap();
        assert_eq!(
            query.filters,
            vec![
                ("grade".to_string(), "MG".to_string()),
                ("series".to_string(), "Mobile Suit Gundam".to_string())
            ]
        );

        let bad = MobileSuitParams {
            grade: Some("Mega Size".into()),
            ..Default::default()
        };
        assert!(bad.to_query().is_err());
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let mut suit = MobileSuit::new("Zaku II", Grade::HighGrade);
        suit.series = Some("Mobile Suit Gundam".into());
        suit.price_yen = Some(1320);

        let update: UpdateMobileSuitRequest =
            serde_json::from_value(serde_json::json!({ "scale": "1/144", "series": "" })).unwrap();
        update.apply_to(&mut suit).unwrap();

        assert_eq!(suit.name, "Zaku II");
        assert_eq!(suit.scale.as_deref(), Some("1/144"));
        assert_eq!(suit.series, None);
        assert_eq!(suit.price_yen, Some(1320));
        assert_eq!(suit.grade, Grade::HighGrade);
    }

    #[test]
    fn test_create_requires_name() {
        let request: CreateMobileSuitRequest =
            serde_json::from_value(serde_json::json!({ "name": "  " })).unwrap();
        assert!(request.into_document().is_err());
    }

    #[test]
    fn test_price_upper_bound() {
        let request: CreateMobileSuitRequest = serde_json::from_value(
            serde_json::json!({ "name": "PG Unleashed", "price_yen": 2_000_000 }),
        )
        .unwrap();
        assert!(request.into_document().is_err());
    }
}

//! 百科 DTO：机体条目与人物

use serde::Deserialize;

use crate::api::dto::common_dto::*;
use crate::models::{LoreCharacter, LoreMobileSuit};
use crate::security::validation::{RequestValidator, Validatable, ValidationResult, validators};
use crate::storage::repository::ListQuery;

/// `GET /lore` 查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoreParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub q: Option<String>,
    pub faction: Option<String>,
    pub manufacturer: Option<String>,
}

impl LoreParams {
    pub fn to_query(&self) -> ValidationResult<ListQuery> {
        Ok(base_query(self.page, self.limit, self.q.clone())?
            .with_filter("faction", self.faction.clone())
            .with_filter("manufacturer", self.manufacturer.clone()))
    }
}

/// `GET /lore-characters` 查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CharacterParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub q: Option<String>,
    pub affiliation: Option<String>,
}

impl CharacterParams {
    pub fn to_query(&self) -> ValidationResult<ListQuery> {
        Ok(base_query(self.page, self.limit, self.q.clone())?
            .with_filter("affiliation", self.affiliation.clone()))
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateLoreMobileSuitRequest {
    /// 百科页面地址，业务唯一键
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
    pub specs: Vec<SpecEntryInput>,
    #[serde(default)]
    pub armaments: Vec<ArmamentGroupInput>,
}

impl Validatable for CreateLoreMobileSuitRequest {
    fn validate(&self) -> ValidationResult<()> {
        RequestValidator::validate_url("url", self.url.trim())?;
        validators::validate_name("name", &self.name)?;
        validators::validate_description("description", &self.description)
    }
}

impl CreateLoreMobileSuitRequest {
    pub fn into_document(self) -> ValidationResult<LoreMobileSuit> {
        self.validate()?;

        let mut suit = LoreMobileSuit::new(&self.url, &self.name);
        suit.model_number = self.model_number.and_then(optional_text);
        suit.manufacturer = self.manufacturer.and_then(optional_text);
        suit.faction = self.faction.and_then(optional_text);
        suit.series = self.series.and_then(optional_text);
        suit.pilots = clean_list(self.pilots);
        suit.description = self.description.trim().to_string();
        suit.specs = to_spec_table(self.specs);
        suit.armaments = to_armaments(self.armaments);
        Ok(suit)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateLoreMobileSuitRequest {
    pub url: Option<String>,
    pub name: Option<String>,
    pub model_number: Option<String>,
    pub manufacturer: Option<String>,
    pub faction: Option<String>,
    pub series: Option<String>,
    pub pilots: Option<Vec<String>>,
    pub description: Option<String>,
    pub specs: Option<Vec<SpecEntryInput>>,
    pub armaments: Option<Vec<ArmamentGroupInput>>,
}

impl Validatable for UpdateLoreMobileSuitRequest {
    fn validate(&self) -> ValidationResult<()> {
        if let Some(url) = &self.url {
            RequestValidator::validate_url("url", url.trim())?;
        }
        if let Some(name) = &self.name {
            validators::validate_name("name", name)?;
        }
        if let Some(description) = &self.description {
            validators::validate_description("description", description)?;
        }
        Ok(())
    }
}

impl UpdateLoreMobileSuitRequest {
    pub fn apply_to(self, suit: &mut LoreMobileSuit) -> ValidationResult<()> {
        self.validate()?;

        if let Some(url) = self.url {
            suit.url = url.trim().to_string();
        }
        if let Some(name) = self.name {
            suit.name = name.trim().to_string();
        }
        if let Some(model_number) = self.model_number {
            suit.model_number = optional_text(model_number);
        }
        if let Some(manufacturer) = self.manufacturer {
            suit.manufacturer = optional_text(manufacturer);
        }
        if let Some(faction) = self.faction {
            suit.faction = optional_text(faction);
        }
        if let Some(series) = self.series {
            suit.series = optional_text(series);
        }
        if let Some(pilots) = self.pilots {
            suit.pilots = clean_list(pilots);
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
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCharacterRequest {
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub affiliation: Option<String>,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub profile: Vec<SpecEntryInput>,
    #[serde(default)]
    pub mobile_suits: Vec<String>,
}

impl Validatable for CreateCharacterRequest {
    fn validate(&self) -> ValidationResult<()> {
        RequestValidator::validate_url("url", self.url.trim())?;
        validators::validate_name("name", &self.name)?;
        validators::validate_description("description", &self.description)
    }
}

impl CreateCharacterRequest {
    pub fn into_document(self) -> ValidationResult<LoreCharacter> {
        self.validate()?;

        let mut character = LoreCharacter::new(&self.url, &self.name);
        character.affiliation = self.affiliation.and_then(optional_text);
        character.rank = self.rank.and_then(optional_text);
        character.description = self.description.trim().to_string();
        character.profile = to_spec_table(self.profile);
        character.mobile_suits = clean_list(self.mobile_suits);
        Ok(character)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateCharacterRequest {
    pub url: Option<String>,
    pub name: Option<String>,
    pub affiliation: Option<String>,
    pub rank: Option<String>,
    pub description: Option<String>,
    pub profile: Option<Vec<SpecEntryInput>>,
    pub mobile_suits: Option<Vec<String>>,
}

impl Validatable for UpdateCharacterRequest {
    fn validate(&self) -> ValidationResult<()> {
        if let Some(url) = &self.url {
            RequestValidator::validate_url("url", url.trim())?;
        }
        if let Some(name) = &self.name {
            validators::validate_name("name", name)?;
        }
        if let Some(description) = &self.description {
            validators::validate_description("description", description)?;
        }
        Ok(())
    }
}

impl UpdateCharacterRequest {
    pub fn apply_to(self, character: &mut LoreCharacter) -> ValidationResult<()> {
        self.validate()?;

        if let Some(url) = self.url {
            character.url = url.trim().to_string();
        }
        if let Some(name) = self.name {
            character.name = name.trim().to_string();
        }
        if let Some(affiliation) = self.affiliation {
            character.affiliation = optional_text(affiliation);
        }
        if let Some(rank) = self.rank {
            character.rank = optional_text(rank);
        }
        if let Some(description) = self.description {
            character.description = description.trim().to_string();
        }
        if let Some(profile) = self.profile {
            character.profile = to_spec_table(profile);
        }
        if let Some(mobile_suits) = self.mobile_suits {
            character.mobile_suits = clean_list(mobile_suits);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_character() {
        let request: CreateCharacterRequest = serde_json::from_value(serde_json::json!({
            "url": "https://gundam.fandom.com/wiki/Char_Aznable",
            "name": "Char Aznable",
            "affiliation": "Principality of Zeon",
            "profile": [{ "key": "Gender", "value": "Male" }],
            "mobile_suits": ["MS-06S Zaku II", " ", "MSN-04 Sazabi"]
        }))
        .unwrap();

        let character = request.into_document().unwrap();
        assert_eq!(character.profile.get("gender"), Some("Male"));
        assert_eq!(character.mobile_suits.len(), 2);
    }

    #[test]
    fn test_lore_url_must_be_valid() {
        let request: CreateLoreMobileSuitRequest = serde_json::from_value(serde_json::json!({
            "url": "not a url",
            "name": "RX-78-2 Gundam"
        }))
        .unwrap();
        assert!(request.into_document().is_err());
    }

    #[test]
    fn test_update_lore_clears_faction() {
        let mut suit = LoreMobileSuit::new("https://gundam.fandom.com/wiki/GM", "GM");
        suit.faction = Some("Earth Federation".into());
        suit.pilots = vec!["Ryu Jose".into()];

        UpdateLoreMobileSuitRequest {
            faction: Some(String::new()),
            ..Default::default()
        }
        .apply_to(&mut suit)
        .unwrap();

        assert_eq!(suit.faction, None);
        assert_eq!(suit.pilots, vec!["Ryu Jose"]);
    }
}

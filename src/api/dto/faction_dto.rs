//! 势力 DTO

use serde::{Deserialize, Serialize};

use crate::api::dto::common_dto::*;
use crate::models::{Faction, Force};
use crate::security::validation::{Validatable, ValidationResult, validators};
use crate::storage::repository::ListQuery;

/// `GET /factions` 查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FactionParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub q: Option<String>,
    pub era: Option<String>,
}

impl FactionParams {
    pub fn to_query(&self) -> ValidationResult<ListQuery> {
        Ok(base_query(self.page, self.limit, self.q.clone())?.with_filter("era", self.era.clone()))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ForceInput {
    pub name: String,
    #[serde(default)]
    pub teams: Vec<String>,
}

fn to_forces(forces: Vec<ForceInput>) -> Vec<Force> {
    forces
        .into_iter()
        .filter(|f| !f.name.trim().is_empty())
        .map(|f| Force::new(&f.name, clean_list(f.teams)))
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct CreateFactionRequest {
    pub name: String,
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
    pub forces: Vec<ForceInput>,
    #[serde(default)]
    pub source_url: Option<String>,
}

impl Validatable for CreateFactionRequest {
    fn validate(&self) -> ValidationResult<()> {
        validators::validate_name("name", &self.name)?;
        validators::validate_description("description", &self.description)?;
        validators::validate_optional_url("source_url", self.source_url.as_deref())
    }
}

impl CreateFactionRequest {
    pub fn into_document(self) -> ValidationResult<Faction> {
        self.validate()?;

        let mut faction = Faction::new(&self.name);
        faction.era = self.era.trim().to_string();
        faction.description = self.description.trim().to_string();
        faction.leaders = clean_list(self.leaders);
        faction.allies = clean_list(self.allies);
        faction.enemies = clean_list(self.enemies);
        faction.headquarters = self.headquarters.and_then(optional_text);
        faction.forces = to_forces(self.forces);
        faction.source_url = self.source_url.and_then(optional_text);
        Ok(faction)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateFactionRequest {
    pub name: Option<String>,
    pub era: Option<String>,
    pub description: Option<String>,
    pub leaders: Option<Vec<String>>,
    pub allies: Option<Vec<String>>,
    pub enemies: Option<Vec<String>>,
    pub headquarters: Option<String>,
    pub forces: Option<Vec<ForceInput>>,
    pub source_url: Option<String>,
}

impl Validatable for UpdateFactionRequest {
    fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.name {
            validators::validate_name("name", name)?;
        }
        if let Some(description) = &self.description {
            validators::validate_description("description", description)?;
        }
        validators::validate_optional_url("source_url", self.source_url.as_deref())
    }
}

impl UpdateFactionRequest {
    pub fn apply_to(self, faction: &mut Faction) -> ValidationResult<()> {
        self.validate()?;

        if let Some(name) = self.name {
            faction.name = name.trim().to_string();
        }
        if let Some(era) = self.era {
            faction.era = era.trim().to_string();
        }
        if let Some(description) = self.description {
            faction.description = description.trim().to_string();
        }
        if let Some(leaders) = self.leaders {
            faction.leaders = clean_list(leaders);
        }
        if let Some(allies) = self.allies {
            faction.allies = clean_list(allies);
        }
        if let Some(enemies) = self.enemies {
            faction.enemies = clean_list(enemies);
        }
        if let Some(headquarters) = self.headquarters {
            faction.headquarters = optional_text(headquarters);
        }
        if let Some(forces) = self.forces {
            faction.forces = to_forces(forces);
        }
        if let Some(source_url) = self.source_url {
            faction.source_url = optional_text(source_url);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_faction_with_forces() {
        let request: CreateFactionRequest = serde_json::from_value(serde_json::json!({
            "name": "Principality of Zeon",
            "era": "Universal Century",
            "leaders": ["Degwin Sodo Zabi", "Gihren Zabi"],
            "forces": [
                { "name": "Zeon Space Army", "teams": ["Black Tri-Stars", ""] },
                { "name": " ", "teams": ["ignored"] }
            ]
        }))
        .unwrap();

        let faction = request.into_document().unwrap();
        assert_eq!(faction.forces.len(), 1);
        assert_eq!(faction.team_count(), 1);
        assert_eq!(faction.leaders.len(), 2);
    }

    #[test]
    fn test_update_only_touches_present_fields() {
        let mut faction = Faction::new("AEUG");
        faction.era = "Universal Century".into();
        faction.headquarters = Some("Granada".into());

        UpdateFactionRequest {
            description: Some("Anti-Earth Union Group".into()),
            ..Default::default()
        }
        .apply_to(&mut faction)
        .unwrap();

        assert_eq!(faction.era, "Universal Century");
        assert_eq!(faction.headquarters.as_deref(), Some("Granada"));
        assert_eq!(faction.description, "Anti-Earth Union Group");
    }
}

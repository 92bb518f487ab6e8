//! 时间线 DTO

use serde::Deserialize;

use crate::api::dto::common_dto::optional_text;
use crate::models::{Timeline, TimelineEvent};
use crate::security::validation::{Validatable, ValidationResult, validators};
use crate::services::timeline::EventChanges;

#[derive(Debug, Clone, Deserialize)]
pub struct EventInput {
    pub date: String,
    #[serde(default)]
    pub year: Option<i32>,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl Validatable for EventInput {
    fn validate(&self) -> ValidationResult<()> {
        validators::validate_name("title", &self.title)?;
        validators::validate_description("description", &self.description)
    }
}

impl EventInput {
    pub fn into_event(self) -> ValidationResult<TimelineEvent> {
        self.validate()?;
        Ok(TimelineEvent::new(&self.date, self.year, &self.title, &self.description))
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTimelineRequest {
    pub name: String,
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub events: Vec<EventInput>,
}

impl Validatable for CreateTimelineRequest {
    fn validate(&self) -> ValidationResult<()> {
        validators::validate_name("name", &self.name)?;
        validators::validate_description("description", &self.description)?;
        self.events.iter().try_for_each(Validatable::validate)
    }
}

impl CreateTimelineRequest {
    pub fn into_document(self) -> ValidationResult<Timeline> {
        self.validate()?;

        let mut timeline = Timeline::new(&self.name, self.order);
        timeline.abbreviation = self.abbreviation.and_then(optional_text);
        timeline.description = self.description.trim().to_string();
        for event in self.events {
            timeline.events.push(event.into_event()?);
        }
        timeline.sort_events();
        Ok(timeline)
    }
}

/// 纪元本身的局部更新（事件通过单独的接口维护）
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateTimelineRequest {
    pub name: Option<String>,
    pub abbreviation: Option<String>,
    pub order: Option<u32>,
    pub description: Option<String>,
}

impl Validatable for UpdateTimelineRequest {
    fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.name {
            validators::validate_name("name", name)?;
        }
        if let Some(description) = &self.description {
            validators::validate_description("description", description)?;
        }
        Ok(())
    }
}

impl UpdateTimelineRequest {
    pub fn apply_to(self, timeline: &mut Timeline) -> ValidationResult<()> {
        self.validate()?;

        if let Some(name) = self.name {
            timeline.name = name.trim().to_string();
        }
        if let Some(abbreviation) = self.abbreviation {
            timeline.abbreviation = optional_text(abbreviation);
        }
        if let Some(order) = self.order {
            timeline.order = order;
        }
        if let Some(description) = self.description {
            timeline.description = description.trim().to_string();
        }
        Ok(())
    }
}

/// 事件局部更新；`year: null` 清除年份
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateEventRequest {
    pub date: Option<String>,
    #[serde(deserialize_with = "present")]
    pub year: Option<Option<i32>>,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// 字段出现即为 `Some`，其值可以是 null
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdateEventRequest {
    pub fn into_changes(self) -> ValidationResult<EventChanges> {
        if let Some(title) = &self.title {
            validators::validate_name("title", title)?;
        }
        if let Some(description) = &self.description {
            validators::validate_description("description", description)?;
        }
        Ok(EventChanges {
            date: self.date,
            year: self.year,
            title: self.title,
            description: self.description,
        })
    }
}

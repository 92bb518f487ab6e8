use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

use crate::storage::repository::Document;

/// 纪元中的单个事件
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimelineEvent {
    pub id: String,
    /// 纪元内的日期文本，例如 "U.C. 0079.01.03"
    pub date: String,
    /// 排序用年份
    #[serde(default)]
    pub year: Option<i32>,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl TimelineEvent {
    pub fn new(date: &str, year: Option<i32>, title: &str, description: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date: date.trim().to_string(),
            year,
            title: title.trim().to_string(),
            description: description.trim().to_string(),
        }
    }

    /// 事件顺序：有年份的在前并按年份升序，同年按日期文本升序
    fn chronological(&self, other: &Self) -> Ordering {
        match (self.year, other.year) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.date.cmp(&other.date)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.date.cmp(&other.date),
        }
    }
}

/// 纪元（时间线）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    pub id: String,
    /// 纪元名称，业务唯一键，例如 "Universal Century"
    pub name: String,
    #[serde(default)]
    pub abbreviation: Option<String>,
    /// 纪元在列表中的顺序
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub events: Vec<TimelineEvent>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Timeline {
    pub fn new(name: &str, order: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            abbreviation: None,
            order,
            description: String::new(),
            events: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 保持事件按时间顺序排列（稳定排序）
    pub fn sort_events(&mut self) {
        self.events.sort_by(|a, b| a.chronological(b));
    }

    pub fn add_event(&mut self, event: TimelineEvent) {
        self.events.push(event);
        self.sort_events();
    }

    pub fn event_mut(&mut self, event_id: &str) -> Option<&mut TimelineEvent> {
        self.events.iter_mut().find(|e| e.id == event_id)
    }

    pub fn remove_event(&mut self, event_id: &str) -> Option<TimelineEvent> {
        let idx = self.events.iter().position(|e| e.id == event_id)?;
        Some(self.events.remove(idx))
    }
}

impl Document for Timeline {
    const COLLECTION: &'static str = "timeline";
    const NATURAL_KEY: &'static str = "name";
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "abbreviation", "description"];
    const SORT_FIELD: &'static str = "order";

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_sorted_by_year_then_date() {
        let mut uc = Timeline::new("Universal Century", 1);
        uc.add_event(TimelineEvent::new("0087.03.02", Some(87), "Gryps Conflict begins", ""));
        uc.add_event(TimelineEvent::new("0079.01.03", Some(79), "One Year War begins", ""));
        uc.add_event(TimelineEvent::new("unknown", None, "Legend", ""));
        uc.add_event(TimelineEvent::new("0079.12.31", Some(79), "A Baoa Qu", ""));

        let titles: Vec<_> = uc.events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["One Year War begins", "A Baoa Qu", "Gryps Conflict begins", "Legend"]
        );
    }

    #[test]
    fn test_remove_event() {
        let mut uc = Timeline::new("Universal Century", 1);
        let event = TimelineEvent::new("0079", Some(79), "One Year War", "");
        let id = event.id.clone();
        uc.add_event(event);

        assert!(uc.remove_event("missing").is_none());
        assert_eq!(uc.remove_event(&id).map(|e| e.title), Some("One Year War".into()));
        assert!(uc.events.is_empty());
    }
}

//! 时间线服务
//!
//! 纪元 CRUD 复用内容服务，事件作为纪元内的嵌入数组维护。

use crate::error::{AppError, Result};
use crate::models::{Timeline, TimelineEvent};
use crate::services::content::ContentService;

/// 事件的可修改字段
#[derive(Debug, Clone, Default)]
pub struct EventChanges {
    pub date: Option<String>,
    pub year: Option<Option<i32>>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl EventChanges {
    fn apply_to(self, event: &mut TimelineEvent) {
        if let Some(date) = self.date {
            event.date = date.trim().to_string();
        }
        if let Some(year) = self.year {
            event.year = year;
        }
        if let Some(title) = self.title {
            event.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            event.description = description.trim().to_string();
        }
    }
}

#[derive(Clone)]
pub struct TimelineService {
    content: ContentService<Timeline>,
}

impl TimelineService {
    pub fn new(content: ContentService<Timeline>) -> Self {
        Self { content }
    }

    /// 纪元本身的 CRUD
    pub fn eras(&self) -> &ContentService<Timeline> {
        &self.content
    }

    /// 创建纪元，事件按时间顺序整理
    pub async fn create(&self, mut timeline: Timeline) -> Result<Timeline> {
        timeline.sort_events();
        self.content.create(timeline).await
    }

    pub async fn add_event(&self, timeline_id: &str, event: TimelineEvent) -> Result<Timeline> {
        if event.title.trim().is_empty() {
            return Err(AppError::Validation("事件标题不能为空".to_string()));
        }

        self.content
            .update(timeline_id, move |timeline| {
                timeline.add_event(event);
                Ok(())
            })
            .await
    }

    pub async fn update_event(
        &self,
        timeline_id: &str,
        event_id: &str,
        changes: EventChanges,
    ) -> Result<Timeline> {
        let event_id = event_id.to_string();
        self.content
            .update(timeline_id, move |timeline| {
                let event = timeline
                    .event_mut(&event_id)
                    .ok_or_else(|| AppError::NotFound(format!("timeline event {}", event_id)))?;
                changes.apply_to(event);
                if event.title.is_empty() {
                    return Err(AppError::Validation("事件标题不能为空".to_string()));
                }
                timeline.sort_events();
                Ok(())
            })
            .await
    }

    pub async fn remove_event(&self, timeline_id: &str, event_id: &str) -> Result<Timeline> {
        let event_id = event_id.to_string();
        self.content
            .update(timeline_id, move |timeline| {
                timeline
                    .remove_event(&event_id)
                    .map(|_| ())
                    .ok_or_else(|| AppError::NotFound(format!("timeline event {}", event_id)))
            })
            .await
    }
}

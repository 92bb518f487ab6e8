//! 统计服务
//!
//! 后台仪表盘的汇总数字与分布图数据。

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::Result;
use crate::models::User;
use crate::storage::Repositories;
use crate::storage::repository::{Document, GroupCount, ListQuery, Repository, list_all};

/// 增长曲线最多覆盖的月数
pub const MAX_GROWTH_MONTHS: u32 = 36;

/// 仪表盘汇总
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DashboardStats {
    pub mobile_suits: u64,
    pub lore_mobile_suits: u64,
    pub characters: u64,
    pub factions: u64,
    pub timelines: u64,
    pub timeline_events: u64,
    pub users: u64,
    pub admins: u64,
}

/// 每个纪元的事件数
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EraEvents {
    pub era: String,
    pub order: u32,
    pub events: u64,
}

/// 某月新增内容数
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GrowthPoint {
    /// `YYYY-MM`
    pub month: String,
    pub mobile_suits: u64,
    pub lore_mobile_suits: u64,
    pub characters: u64,
    pub factions: u64,
}

impl GrowthPoint {
    pub fn total(&self) -> u64 {
        self.mobile_suits + self.lore_mobile_suits + self.characters + self.factions
    }
}

#[derive(Clone)]
pub struct AnalyticsService {
    repositories: Repositories,
}

impl AnalyticsService {
    pub fn new(repositories: Repositories) -> Self {
        Self { repositories }
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let all = ListQuery::default();
        let repos = &self.repositories;

        let timelines = list_all(repos.timelines.as_ref()).await?;
        let users: Vec<User> = list_all(repos.users.as_ref()).await?;

        Ok(DashboardStats {
            mobile_suits: repos.mobile_suits.count(&all).await?,
            lore_mobile_suits: repos.lore.count(&all).await?,
            characters: repos.characters.count(&all).await?,
            factions: repos.factions.count(&all).await?,
            timelines: timelines.len() as u64,
            timeline_events: timelines.iter().map(|t| t.events.len() as u64).sum(),
            users: users.len() as u64,
            admins: users.iter().filter(|u| u.is_admin()).count() as u64,
        })
    }

    /// 模型商品按等级分布
    pub async fn mobile_suit_grades(&self) -> Result<Vec<GroupCount>> {
        self.repositories.mobile_suits.group_count("grade").await
    }

    /// 模型商品按作品分布
    pub async fn mobile_suit_series(&self) -> Result<Vec<GroupCount>> {
        self.repositories.mobile_suits.group_count("series").await
    }

    /// 百科机体按制造商分布
    pub async fn lore_manufacturers(&self) -> Result<Vec<GroupCount>> {
        self.repositories.lore.group_count("manufacturer").await
    }

    /// 人物按所属势力分布
    pub async fn character_affiliations(&self) -> Result<Vec<GroupCount>> {
        self.repositories.characters.group_count("affiliation").await
    }

    /// 各纪元事件数，按纪元顺序
    pub async fn timeline_events(&self) -> Result<Vec<EraEvents>> {
        let mut timelines = list_all(self.repositories.timelines.as_ref()).await?;
        timelines.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));

        Ok(timelines
            .into_iter()
            .map(|t| EraEvents {
                events: t.events.len() as u64,
                era: t.name,
                order: t.order,
            })
            .collect())
    }

    /// 最近 `months` 个月（含本月）每月新增的内容数
    pub async fn content_growth(&self, months: u32) -> Result<Vec<GrowthPoint>> {
        self.content_growth_at(months, Utc::now()).await
    }

    async fn content_growth_at(&self, months: u32, now: DateTime<Utc>) -> Result<Vec<GrowthPoint>> {
        let keys = month_keys(now, months.clamp(1, MAX_GROWTH_MONTHS));
        let mut points: Vec<GrowthPoint> = keys
            .iter()
            .map(|month| GrowthPoint {
                month: month.clone(),
                ..Default::default()
            })
            .collect();
        let index: HashMap<String, usize> = keys
            .into_iter()
            .enumerate()
            .map(|(i, k)| (k, i))
            .collect();

        let repos = &self.repositories;
        let suits = monthly(repos.mobile_suits.as_ref()).await?;
        let lore = monthly(repos.lore.as_ref()).await?;
        let characters = monthly(repos.characters.as_ref()).await?;
        let factions = monthly(repos.factions.as_ref()).await?;

        for (counts, pick) in [
            (suits, 0usize),
            (lore, 1),
            (characters, 2),
            (factions, 3),
        ] {
            for (month, count) in counts {
                if let Some(&i) = index.get(&month) {
                    let point = &mut points[i];
                    match pick {
                        0 => point.mobile_suits += count,
                        1 => point.lore_mobile_suits += count,
                        2 => point.characters += count,
                        _ => point.factions += count,
                    }
                }
            }
        }

        Ok(points)
    }
}

fn month_key(at: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", at.year(), at.month())
}

/// 从最早到最近的月份键
fn month_keys(now: DateTime<Utc>, months: u32) -> Vec<String> {
    let mut year = now.year();
    let mut month = now.month() as i32;
    let mut keys = Vec::with_capacity(months as usize);

    for _ in 0..months {
        keys.push(format!("{:04}-{:02}", year, month));
        month -= 1;
        if month == 0 {
            month = 12;
            year -= 1;
        }
    }

    keys.reverse();
    keys
}

async fn monthly<T: Document>(repository: &dyn Repository<T>) -> Result<HashMap<String, u64>> {
    let mut counts = HashMap::new();
    for doc in list_all(repository).await? {
        *counts.entry(month_key(doc.created_at())).or_insert(0) += 1;
    }
    Ok(counts)
}

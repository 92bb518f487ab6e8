//! 后台 DTO：站点设置与统计参数

use serde::Deserialize;

use crate::services::settings::SettingsChanges;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateSettingsRequest {
    pub site_name: Option<String>,
    pub tagline: Option<String>,
    pub items_per_page: Option<usize>,
    pub featured_mobile_suit_ids: Option<Vec<String>>,
    pub maintenance_mode: Option<bool>,
}

impl From<UpdateSettingsRequest> for SettingsChanges {
    fn from(request: UpdateSettingsRequest) -> Self {
        Self {
            site_name: request.site_name,
            tagline: request.tagline,
            items_per_page: request.items_per_page,
            featured_mobile_suit_ids: request.featured_mobile_suit_ids,
            maintenance_mode: request.maintenance_mode,
        }
    }
}

/// `GET /analytics/content-growth` 查询参数
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GrowthParams {
    pub months: u32,
}

impl Default for GrowthParams {
    fn default() -> Self {
        Self { months: 6 }
    }
}

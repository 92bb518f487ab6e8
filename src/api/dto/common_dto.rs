//! 通用 DTO
//!
//! 分页参数、通用响应与可选字段的归一化。

use serde::{Deserialize, Serialize};

use crate::models::{ArmamentGroup, SpecTable};
use crate::security::validation::{ValidationResult, validators};
use crate::storage::repository::{DEFAULT_PAGE_SIZE, ListQuery, Pagination};

/// 列表请求的分页与关键字
///
/// 各集合的查询参数都以这三个字段开头；过滤字段由各自的参数结构追加。
pub fn base_query(page: Option<usize>, limit: Option<usize>, q: Option<String>) -> ValidationResult<ListQuery> {
    if let Some(q) = q.as_deref() {
        validators::validate_search_query(q)?;
    }
    let pagination = Pagination::new(page.unwrap_or(1), limit.unwrap_or(DEFAULT_PAGE_SIZE));
    Ok(ListQuery::new(pagination).with_keyword(q))
}

/// 只有分页与关键字的列表参数
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub q: Option<String>,
}

impl PageParams {
    pub fn to_query(&self) -> ValidationResult<ListQuery> {
        base_query(self.page, self.limit, self.q.clone())
    }
}

/// 删除响应
#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub id: String,
    pub deleted: bool,
}

impl DeletedResponse {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            deleted: true,
        }
    }
}

/// 图片上传响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ImageUploadResponse {
    pub id: String,
    pub image_url: String,
}

/// 规格表行（请求体）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpecEntryInput {
    pub key: String,
    pub value: String,
}

pub fn to_spec_table(entries: Vec<SpecEntryInput>) -> SpecTable {
    entries.into_iter().map(|e| (e.key, e.value)).collect()
}

/// 武装分组（请求体），空分组与空条目被丢弃
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArmamentGroupInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub items: Vec<String>,
}

pub fn to_armaments(groups: Vec<ArmamentGroupInput>) -> Vec<ArmamentGroup> {
    groups
        .into_iter()
        .map(|g| ArmamentGroup::new(&g.name, clean_list(g.items)))
        .filter(|g| !g.items.is_empty())
        .collect()
}

/// 去掉首尾空白，空字符串表示清空
pub fn optional_text(value: String) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// 修剪并去掉空项，保持顺序去重
pub fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim();
        if !item.is_empty() && !out.iter().any(|o| o == item) {
            out.push(item.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_query_defaults_and_clamps() {
        let query = base_query(None, Some(1000), Some("  Zaku ".into())).unwrap();
        assert_eq!(query.pagination.page, 1);
        assert_eq!(query.pagination.limit, 100);
        assert_eq!(query.keyword.as_deref(), Some("zaku"));

        assert!(base_query(None, None, Some("x".repeat(300))).is_err());
    }

    #[test]
    fn test_clean_list_and_optional_text() {
        assert_eq!(
            clean_list(vec![" Amuro ".into(), "".into(), "Amuro".into(), "Sayla".into()]),
            vec!["Amuro", "Sayla"]
        );
        assert_eq!(optional_text("   ".into()), None);
        assert_eq!(optional_text(" 1/144 ".into()).as_deref(), Some("1/144"));
    }
}

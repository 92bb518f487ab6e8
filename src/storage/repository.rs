use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::Result;

/// 单页最大条数
pub const MAX_PAGE_SIZE: usize = 100;
/// 默认每页条数
pub const DEFAULT_PAGE_SIZE: usize = 20;
/// 最大页码
pub const MAX_PAGE: usize = 100_000;

/// 可持久化的文档
///
/// 每种文档对应一个集合（表），通过 `NATURAL_KEY` 字段做业务唯一性判断，
/// 关键字搜索在 `SEARCH_FIELDS` 上做不区分大小写的子串匹配。
pub trait Document: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// 集合名称
    const COLLECTION: &'static str;
    /// 业务唯一键字段
    const NATURAL_KEY: &'static str;
    /// 参与关键字搜索的字段
    const SEARCH_FIELDS: &'static [&'static str];
    /// 列表默认排序字段
    const SORT_FIELD: &'static str;

    fn id(&self) -> &str;

    /// 业务唯一键的值
    fn natural_key(&self) -> String;

    fn created_at(&self) -> DateTime<Utc>;

    /// 沿用已有文档的 id 与创建时间（导入时覆盖更新）
    fn set_identity(&mut self, id: &str, created_at: DateTime<Utc>);

    /// 更新 `updated_at`
    fn touch(&mut self);
}

/// 带封面图的文档
pub trait HasImage: Document {
    fn image_url(&self) -> Option<&str>;
    fn set_image_url(&mut self, url: Option<String>);
}

/// 分页参数
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    /// 页码（从 1 开始）
    pub page: usize,
    /// 每页数量
    pub limit: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    /// 创建分页参数，页码限制在 1..=MAX_PAGE，每页数量限制在 1..=MAX_PAGE_SIZE
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page: page.clamp(1, MAX_PAGE),
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// 计算偏移量
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// 总页数
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit as u64)
    }
}

/// 列表查询
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListQuery {
    pub pagination: Pagination,
    /// 关键字（不区分大小写的子串匹配）
    pub keyword: Option<String>,
    /// 精确匹配过滤（字段名, 值），字段名只来自代码白名单
    pub filters: Vec<(String, String)>,
}

impl ListQuery {
    pub fn new(pagination: Pagination) -> Self {
        Self {
            pagination,
            keyword: None,
            filters: Vec::new(),
        }
    }

    /// 设置关键字，空白关键字视为未设置
    pub fn with_keyword(mut self, keyword: Option<String>) -> Self {
        self.keyword = keyword
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty());
        self
    }

    pub fn with_filter(mut self, field: &str, value: Option<String>) -> Self {
        if let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            self.filters.push((field.to_string(), value));
        }
        self
    }

    /// 用于缓存键的稳定指纹
    pub fn fingerprint(&self) -> String {
        let mut parts = vec![
            format!("p={}", self.pagination.page),
            format!("l={}", self.pagination.limit),
        ];
        if let Some(keyword) = &self.keyword {
            parts.push(format!("q={}", urlencoding::encode(keyword)));
        }
        let mut filters = self.filters.clone();
        filters.sort();
        for (field, value) in filters {
            parts.push(format!("{}={}", field, urlencoding::encode(&value)));
        }
        parts.join(":")
    }
}

/// 一页结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: usize,
    pub limit: usize,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page,
            limit: pagination.limit,
            total_pages: pagination.total_pages(total),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}

/// 分组计数结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupCount {
    pub label: String,
    pub count: u64,
}

/// 仓储 trait
#[async_trait]
pub trait Repository<T: Document>: Send + Sync {
    /// 创建文档
    async fn create(&self, doc: &T) -> Result<T>;

    /// 根据 ID 获取文档
    async fn get_by_id(&self, id: &str) -> Result<Option<T>>;

    /// 覆盖更新文档，不存在时返回 None
    async fn update(&self, id: &str, doc: &T) -> Result<Option<T>>;

    /// 删除文档
    async fn delete(&self, id: &str) -> Result<bool>;

    /// 分页列出文档，按 (SORT_FIELD, id) 排序
    async fn list(&self, query: &ListQuery) -> Result<Vec<T>>;

    /// 统计满足查询条件的数量（忽略分页）
    async fn count(&self, query: &ListQuery) -> Result<u64>;

    /// 按字段精确查找第一条
    async fn find_by_field(&self, field: &str, value: &str) -> Result<Option<T>>;

    /// 按字段分组计数，缺失值归入 "Unknown"
    async fn group_count(&self, field: &str) -> Result<Vec<GroupCount>>;

    /// 检查存储是否可用
    async fn health_check(&self) -> Result<()>;
}

/// 分批读取整个集合
pub async fn list_all<T: Document>(repository: &dyn Repository<T>) -> Result<Vec<T>> {
    let mut all = Vec::new();
    let mut page = 1;

    loop {
        let query = ListQuery::new(Pagination::new(page, MAX_PAGE_SIZE));
        let batch = repository.list(&query).await?;
        let done = batch.len() < MAX_PAGE_SIZE;
        all.extend(batch);
        if done {
            break;
        }
        page += 1;
    }

    Ok(all)
}

use async_trait::async_trait;
use serde::Deserialize;
use std::marker::PhantomData;
use std::sync::Arc;
use surrealdb::{
    Surreal,
    engine::any::{Any, connect},
    opt::auth::Root,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::config::DatabaseConfig;
use crate::error::{AppError, Result};
use crate::storage::repository::{Document, GroupCount, ListQuery, Repository};

/// SurrealDB 连接池
#[derive(Clone)]
pub struct SurrealPool {
    /// 数据库连接
    db: Arc<Mutex<Option<Surreal<Any>>>>,
    /// 连接配置
    config: DatabaseConfig,
}

impl SurrealPool {
    /// 创建新的连接池
    pub async fn new(config: DatabaseConfig) -> std::result::Result<Self, surrealdb::Error> {
        let db: Surreal<Any> = connect(&config.url).await?;

        // 内存引擎不需要认证
        if !config.username.is_empty() {
            db.signin(Root {
                username: &config.username,
                password: &config.password,
            })
            .await?;
        }

        // 选择命名空间和数据库
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "SurrealDB 已连接"
        );

        Ok(Self {
            db: Arc::new(Mutex::new(Some(db))),
            config,
        })
    }

    /// 获取内部数据库实例
    pub async fn inner(&self) -> Result<Surreal<Any>> {
        let guard = self.db.lock().await;
        guard
            .as_ref()
            .cloned()
            .ok_or_else(|| AppError::Connection("数据库连接已关闭".to_string()))
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// 关闭连接
    pub async fn close(&self) {
        let mut guard = self.db.lock().await;
        *guard = None;
    }
}

#[derive(Debug, Deserialize)]
struct CountRow {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct GroupRow {
    label: Option<String>,
    count: u64,
}

/// 通用 SurrealDB 仓储，每种文档一张表
pub struct SurrealRepository<T: Document> {
    pool: SurrealPool,
    _marker: PhantomData<T>,
}

impl<T: Document> Clone for SurrealRepository<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Document> SurrealRepository<T> {
    pub fn new(pool: SurrealPool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    /// 文档内容（去掉 id，id 作为记录键）
    fn content(doc: &T) -> Result<serde_json::Value> {
        let mut value = serde_json::to_value(doc)?;
        if let Some(map) = value.as_object_mut() {
            map.remove("id");
        }
        Ok(value)
    }

    /// WHERE 子句；过滤值按 $f0, $f1 ... 绑定
    fn where_clause(query: &ListQuery) -> String {
        let mut conditions = Vec::new();

        if query.keyword.is_some() && !T::SEARCH_FIELDS.is_empty() {
            let any = T::SEARCH_FIELDS
                .iter()
                .map(|field| format!("string::lowercase({} ?? '') CONTAINS $kw", ident(field)))
                .collect::<Vec<_>>()
                .join(" OR ");
            conditions.push(format!("({})", any));
        }

        for (i, (field, _)) in query.filters.iter().enumerate() {
            conditions.push(format!("{} = $f{}", ident(field), i));
        }

        if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        }
    }
}

/// 字段名转义，字段名只来自代码白名单
fn ident(field: &str) -> String {
    format!("`{}`", field.replace('`', ""))
}

macro_rules! bind_list_query {
    ($request:expr, $query:expr) => {{
        let mut request = $request.bind(("tb", T::COLLECTION));
        if let Some(keyword) = &$query.keyword {
            request = request.bind(("kw", keyword.clone()));
        }
        for (i, (_, value)) in $query.filters.iter().enumerate() {
            request = request.bind((format!("f{}", i), value.clone()));
        }
        request
    }};
}

#[async_trait]
impl<T: Document> Repository<T> for SurrealRepository<T> {
    async fn create(&self, doc: &T) -> Result<T> {
        let db = self.pool.inner().await?;
        db.query("CREATE type::thing($tb, $id) CONTENT $data")
            .bind(("tb", T::COLLECTION))
            .bind(("id", doc.id().to_string()))
            .bind(("data", Self::content(doc)?))
            .await?
            .check()?;

        debug!(collection = T::COLLECTION, id = doc.id(), "文档已创建");
        Ok(doc.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<T>> {
        let db = self.pool.inner().await?;
        let mut result = db
            .query("SELECT *, meta::id(id) AS id FROM type::thing($tb, $id)")
            .bind(("tb", T::COLLECTION))
            .bind(("id", id.to_string()))
            .await?;
        let docs: Vec<T> = result.take(0)?;
        Ok(docs.into_iter().next())
    }

    async fn update(&self, id: &str, doc: &T) -> Result<Option<T>> {
        if self.get_by_id(id).await?.is_none() {
            return Ok(None);
        }

        let db = self.pool.inner().await?;
        db.query("UPDATE type::thing($tb, $id) CONTENT $data")
            .bind(("tb", T::COLLECTION))
            .bind(("id", id.to_string()))
            .bind(("data", Self::content(doc)?))
            .await?
            .check()?;

        Ok(Some(doc.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        if self.get_by_id(id).await?.is_none() {
            return Ok(false);
        }

        let db = self.pool.inner().await?;
        db.query("DELETE type::thing($tb, $id)")
            .bind(("tb", T::COLLECTION))
            .bind(("id", id.to_string()))
            .await?
            .check()?;

        debug!(collection = T::COLLECTION, id, "文档已删除");
        Ok(true)
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<T>> {
        let db = self.pool.inner().await?;
        let sql = format!(
            "SELECT *, meta::id(id) AS id FROM type::table($tb){} ORDER BY {}, id LIMIT $limit START $start",
            Self::where_clause(query),
            ident(T::SORT_FIELD)
        );

        let request = bind_list_query!(db.query(sql), query)
            .bind(("limit", query.pagination.limit))
            .bind(("start", query.pagination.offset()));

        let docs: Vec<T> = request.await?.take(0)?;
        Ok(docs)
    }

    async fn count(&self, query: &ListQuery) -> Result<u64> {
        let db = self.pool.inner().await?;
        let sql = format!(
            "SELECT count() AS count FROM type::table($tb){} GROUP ALL",
            Self::where_clause(query)
        );

        let rows: Vec<CountRow> = bind_list_query!(db.query(sql), query).await?.take(0)?;
        Ok(rows.first().map(|r| r.count).unwrap_or(0))
    }

    async fn find_by_field(&self, field: &str, value: &str) -> Result<Option<T>> {
        let db = self.pool.inner().await?;
        let sql = format!(
            "SELECT *, meta::id(id) AS id FROM type::table($tb) WHERE {} = $value LIMIT 1",
            ident(field)
        );

        let docs: Vec<T> = db
            .query(sql)
            .bind(("tb", T::COLLECTION))
            .bind(("value", value.to_string()))
            .await?
            .take(0)?;
        Ok(docs.into_iter().next())
    }

    async fn group_count(&self, field: &str) -> Result<Vec<GroupCount>> {
        let db = self.pool.inner().await?;
        let sql = format!(
            "SELECT {} AS label, count() AS count FROM type::table($tb) GROUP BY label",
            ident(field)
        );

        let rows: Vec<GroupRow> = db
            .query(sql)
            .bind(("tb", T::COLLECTION))
            .await?
            .take(0)?;

        Ok(merge_groups(rows.into_iter().map(|row| {
            let label = row
                .label
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| "Unknown".to_string());
            (label, row.count)
        })))
    }

    async fn health_check(&self) -> Result<()> {
        let db = self.pool.inner().await?;
        db.query("RETURN 1").await?.check()?;
        Ok(())
    }
}

/// 合并同名分组（空值与缺失值都归入 Unknown），按数量降序
pub(crate) fn merge_groups(rows: impl Iterator<Item = (String, u64)>) -> Vec<GroupCount> {
    let mut groups: Vec<GroupCount> = Vec::new();
    for (label, count) in rows {
        match groups.iter_mut().find(|g| g.label == label) {
            Some(group) => group.count += count,
            None => groups.push(GroupCount { label, count }),
        }
    }
    groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    groups
}

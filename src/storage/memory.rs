use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::storage::repository::{Document, GroupCount, ListQuery, Repository};
use crate::storage::surrealdb::merge_groups;

/// 内存仓储，用于测试与 `memory` 后端
pub struct MemoryRepository<T: Document> {
    docs: Arc<RwLock<HashMap<String, T>>>,
}

impl<T: Document> Clone for MemoryRepository<T> {
    fn clone(&self) -> Self {
        Self {
            docs: self.docs.clone(),
        }
    }
}

impl<T: Document> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Document> MemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            docs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    /// 满足条件的文档，按 (SORT_FIELD, id) 排序
    fn matching(&self, query: &ListQuery) -> Result<Vec<(Value, T)>> {
        let docs = self.docs.read();
        let mut matched = Vec::new();

        for doc in docs.values() {
            let value = serde_json::to_value(doc)?;
            if matches_query(&value, query, T::SEARCH_FIELDS) {
                matched.push((value, doc.clone()));
            }
        }

        matched.sort_by(|(a, a_doc), (b, b_doc)| {
            compare_values(a.get(T::SORT_FIELD), b.get(T::SORT_FIELD))
                .then_with(|| a_doc.id().cmp(b_doc.id()))
        });

        Ok(matched)
    }
}

fn matches_query(value: &Value, query: &ListQuery, search_fields: &[&str]) -> bool {
    for (field, expected) in &query.filters {
        match value.get(field).and_then(scalar_text) {
            Some(actual) if actual == *expected => {}
            _ => return false,
        }
    }

    match &query.keyword {
        Some(keyword) => search_fields
            .iter()
            .filter_map(|field| value.get(*field).and_then(scalar_text))
            .any(|text| text.to_lowercase().contains(keyword.as_str())),
        None => true,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// 数字按数值比较，字符串按字典序，缺失值排最前
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(a), Some(b)) => a.to_string().cmp(&b.to_string()),
    }
}

#[async_trait]
impl<T: Document> Repository<T> for MemoryRepository<T> {
    async fn create(&self, doc: &T) -> Result<T> {
        let mut docs = self.docs.write();
        if docs.contains_key(doc.id()) {
            return Err(AppError::Conflict(format!(
                "{} {} 已存在",
                T::COLLECTION,
                doc.id()
            )));
        }
        docs.insert(doc.id().to_string(), doc.clone());
        Ok(doc.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<T>> {
        Ok(self.docs.read().get(id).cloned())
    }

    async fn update(&self, id: &str, doc: &T) -> Result<Option<T>> {
        let mut docs = self.docs.write();
        match docs.get_mut(id) {
            Some(existing) => {
                *existing = doc.clone();
                Ok(Some(doc.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.docs.write().remove(id).is_some())
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<T>> {
        Ok(self
            .matching(query)?
            .into_iter()
            .skip(query.pagination.offset())
            .take(query.pagination.limit)
            .map(|(_, doc)| doc)
            .collect())
    }

    async fn count(&self, query: &ListQuery) -> Result<u64> {
        Ok(self.matching(query)?.len() as u64)
    }

    async fn find_by_field(&self, field: &str, value: &str) -> Result<Option<T>> {
        let mut query = ListQuery::default();
        query.filters.push((field.to_string(), value.to_string()));
        Ok(self.matching(&query)?.into_iter().next().map(|(_, doc)| doc))
    }

    async fn group_count(&self, field: &str) -> Result<Vec<GroupCount>> {
        let docs = self.docs.read();
        let mut rows = Vec::with_capacity(docs.len());
        for doc in docs.values() {
            let value = serde_json::to_value(doc)?;
            let label = value
                .get(field)
                .and_then(scalar_text)
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| "Unknown".to_string());
            rows.push((label, 1));
        }
        Ok(merge_groups(rows.into_iter()))
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

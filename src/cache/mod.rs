//! 缓存模块
//!
//! 读穿缓存：Redis（生产）、内存（本地开发 / 测试）与空实现（关闭缓存）。

pub mod memory;
pub mod redis_cache;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::config::CacheConfig;
use crate::error::Result;
use crate::observability::{AppMetrics, CacheOutcome};

pub use memory::{MemoryCache, NoopCache};
pub use redis_cache::RedisCache;

/// 缓存后端
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// 删除所有以 `prefix` 开头的键，返回删除数量
    async fn invalidate_prefix(&self, prefix: &str) -> Result<u64>;

    async fn ping(&self) -> Result<()>;

    fn backend(&self) -> &'static str;
}

/// 缓存键
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    prefix: String,
}

impl CacheKeys {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim_end_matches(':').to_string(),
        }
    }

    /// `{prefix}:{collection}:`
    pub fn collection(&self, collection: &str) -> String {
        format!("{}:{}:", self.prefix, collection)
    }

    /// `{prefix}:{collection}:item:{id}`
    pub fn item(&self, collection: &str, id: &str) -> String {
        format!("{}item:{}", self.collection(collection), id)
    }

    /// `{prefix}:{collection}:list:{fingerprint}`
    pub fn list(&self, collection: &str, fingerprint: &str) -> String {
        format!("{}list:{}", self.collection(collection), fingerprint)
    }
}

/// 读穿缓存封装
///
/// 缓存故障只记录 warn 并按未命中处理，不会让请求失败。
///
/// 每个集合有一个进程内的写入代数：读存储前取代数，回填时代数已变则不写入缓存，
/// 避免读写交错时把旧数据重新缓存到 TTL 结束。
#[derive(Clone)]
pub struct ReadThrough {
    cache: Arc<dyn Cache>,
    keys: CacheKeys,
    ttl: Duration,
    metrics: Option<Arc<AppMetrics>>,
    generations: Arc<DashMap<String, u64>>,
}

impl ReadThrough {
    pub fn new(cache: Arc<dyn Cache>, config: &CacheConfig) -> Self {
        Self {
            cache,
            keys: CacheKeys::new(&config.key_prefix),
            ttl: Duration::from_secs(config.ttl_seconds.max(1)),
            metrics: None,
            generations: Arc::new(DashMap::new()),
        }
    }

    /// 关闭缓存
    pub fn disabled() -> Self {
        Self {
            cache: Arc::new(NoopCache),
            keys: CacheKeys::new("codex"),
            ttl: Duration::from_secs(1),
            metrics: None,
            generations: Arc::new(DashMap::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<AppMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn keys(&self) -> &CacheKeys {
        &self.keys
    }

    pub fn backend(&self) -> Arc<dyn Cache> {
        self.cache.clone()
    }

    fn record(&self, collection: &str, outcome: CacheOutcome) {
        if let Some(metrics) = &self.metrics {
            metrics.record_cache(collection, outcome);
        }
    }

    /// 读取并反序列化，任何失败都视为未命中
    pub async fn get_json<V: DeserializeOwned>(&self, collection: &str, key: &str) -> Option<V> {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!(key, "缓存命中");
                    self.record(collection, CacheOutcome::Hit);
                    Some(value)
                }
                Err(e) => {
                    warn!(key, error = %e, "缓存内容无法解析，按未命中处理");
                    self.record(collection, CacheOutcome::Error);
                    None
                }
            },
            Ok(None) => {
                self.record(collection, CacheOutcome::Miss);
                None
            }
            Err(e) => {
                warn!(key, error = %e, "读取缓存失败，按未命中处理");
                self.record(collection, CacheOutcome::Error);
                None
            }
        }
    }

    /// 集合当前的写入代数
    pub fn generation(&self, collection: &str) -> u64 {
        self.generations.get(collection).map(|g| *g).unwrap_or(0)
    }

    /// 回填缓存；`generation` 是读存储之前取到的代数
    pub async fn put_json<V: Serialize + Sync>(
        &self,
        collection: &str,
        generation: u64,
        key: &str,
        value: &V,
    ) {
        if self.generation(collection) != generation {
            debug!(key, "读取期间集合已被修改，跳过回填");
            return;
        }

        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "缓存序列化失败");
                return;
            }
        };

        if let Err(e) = self.cache.set(key, &raw, self.ttl).await {
            warn!(key, error = %e, "写入缓存失败");
            return;
        }

        // 写入与失效交错：失效已先递增代数，这里撤回刚写入的值
        if self.generation(collection) != generation {
            if let Err(e) = self.cache.invalidate_prefix(key).await {
                warn!(key, error = %e, "撤回缓存失败");
            }
        }
    }

    /// 写操作后清除整个集合的缓存
    pub async fn invalidate_collection(&self, collection: &str) {
        *self.generations.entry(collection.to_string()).or_insert(0) += 1;
        let prefix = self.keys.collection(collection);
        match self.cache.invalidate_prefix(&prefix).await {
            Ok(removed) => debug!(prefix = %prefix, removed, "缓存已失效"),
            Err(e) => warn!(prefix = %prefix, error = %e, "清除缓存失败"),
        }
    }
}

/// 根据配置创建缓存后端；Redis 不可用时退化为不缓存
pub async fn create_cache(config: &CacheConfig) -> Arc<dyn Cache> {
    if !config.enabled {
        return Arc::new(NoopCache);
    }

    match RedisCache::connect(&config.redis_url).await {
        Ok(cache) => Arc::new(cache),
        Err(e) => {
            warn!(error = %e, url = %config.redis_url, "Redis 不可用，关闭缓存");
            Arc::new(NoopCache)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use mockall::predicate::eq;

    fn config() -> CacheConfig {
        CacheConfig {
            enabled: true,
            redis_url: String::new(),
            key_prefix: "codex".into(),
            ttl_seconds: 60,
        }
    }

    #[test]
    fn test_cache_keys() {
        let keys = CacheKeys::new("codex:");
        assert_eq!(keys.item("faction", "abc"), "codex:faction:item:abc");
        assert_eq!(keys.list("faction", "p=1:l=20"), "codex:faction:list:p=1:l=20");
        assert!(keys.item("faction", "abc").starts_with(&keys.collection("faction")));
    }

    #[tokio::test]
    async fn test_cache_errors_are_misses() {
        let mut mock = MockCache::new();
        mock.expect_get()
            .returning(|_| Err(AppError::Cache("timeout".into())));
        mock.expect_set()
            .returning(|_, _, _| Err(AppError::Cache("timeout".into())));
        mock.expect_invalidate_prefix()
            .with(eq("codex:faction:"))
            .times(1)
            .returning(|_| Err(AppError::Cache("timeout".into())));

        let metrics = Arc::new(AppMetrics::new().unwrap());
        let cache = ReadThrough::new(Arc::new(mock), &config()).with_metrics(metrics.clone());

        let value: Option<Vec<String>> = cache.get_json("faction", "codex:faction:item:1").await;
        assert!(value.is_none());
        cache.put_json("faction", 0, "codex:faction:item:1", &vec!["x"]).await;
        cache.invalidate_collection("faction").await;

        assert_eq!(metrics.cache_count("faction", CacheOutcome::Error), 1);
    }

    #[tokio::test]
    async fn test_garbage_payload_is_a_miss() {
        let mut mock = MockCache::new();
        mock.expect_get()
            .returning(|_| Ok(Some("{not json".to_string())));

        let cache = ReadThrough::new(Arc::new(mock), &config());
        let value: Option<u32> = cache.get_json("faction", "k").await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_stale_read_is_not_cached_after_invalidation() {
        let memory = MemoryCache::new();
        let cache = ReadThrough::new(Arc::new(memory.clone()), &config());
        let key = cache.keys().item("faction", "1");

        // 读存储前取代数，回填前发生了一次写入
        let before = cache.generation("faction");
        cache.invalidate_collection("faction").await;
        cache.put_json("faction", before, &key, &"stale").await;
        assert!(memory.is_empty());

        let current = cache.generation("faction");
        assert_eq!(current, before + 1);
        cache.put_json("faction", current, &key, &"fresh").await;
        assert_eq!(cache.get_json::<String>("faction", &key).await.as_deref(), Some("fresh"));

        // 其他集合不受影响
        assert_eq!(cache.generation("timeline"), 0);
    }

    #[tokio::test]
    async fn test_disabled_config_uses_noop() {
        let cache = create_cache(&CacheConfig {
            enabled: false,
            ..config()
        })
        .await;
        assert_eq!(cache.backend(), "noop");
    }
}

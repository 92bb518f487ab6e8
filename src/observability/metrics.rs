//! Prometheus 指标

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

use crate::error::{AppError, Result};

/// 缓存查询结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
    Error,
}

impl CacheOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            CacheOutcome::Hit => "hit",
            CacheOutcome::Miss => "miss",
            CacheOutcome::Error => "error",
        }
    }
}

/// 应用指标
#[derive(Clone)]
pub struct AppMetrics {
    registry: Registry,
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    http_requests_in_flight: IntGauge,
    cache_lookups_total: IntCounterVec,
}

impl std::fmt::Debug for AppMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppMetrics").finish_non_exhaustive()
    }
}

impl AppMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new_custom(Some("gundam_codex".to_string()), None)
            .map_err(metrics_error)?;

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests"),
            &["method", "path", "status"],
        )
        .map_err(metrics_error)?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            ),
            &["method", "path"],
        )
        .map_err(metrics_error)?;

        let http_requests_in_flight =
            IntGauge::new("http_requests_in_flight", "HTTP requests being served")
                .map_err(metrics_error)?;

        let cache_lookups_total = IntCounterVec::new(
            Opts::new("cache_lookups_total", "Read-through cache lookups"),
            &["collection", "result"],
        )
        .map_err(metrics_error)?;

        registry
            .register(Box::new(http_requests_total.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(http_requests_in_flight.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(cache_lookups_total.clone()))
            .map_err(metrics_error)?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            cache_lookups_total,
        })
    }

    /// 记录 HTTP 请求
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, seconds: f64) {
        self.http_requests_total
            .with_label_values(&[method, path, &status.to_string()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(seconds);
    }

    pub fn request_started(&self) {
        self.http_requests_in_flight.inc();
    }

    pub fn request_finished(&self) {
        self.http_requests_in_flight.dec();
    }

    /// 记录缓存命中情况
    pub fn record_cache(&self, collection: &str, outcome: CacheOutcome) {
        self.cache_lookups_total
            .with_label_values(&[collection, outcome.as_str()])
            .inc();
    }

    pub fn cache_count(&self, collection: &str, outcome: CacheOutcome) -> u64 {
        self.cache_lookups_total
            .with_label_values(&[collection, outcome.as_str()])
            .get()
    }

    /// 生成 Prometheus 文本格式指标
    pub fn gather(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metrics_error)?;
        String::from_utf8(buffer).map_err(|e| AppError::Internal(e.to_string()))
    }
}

fn metrics_error(e: prometheus::Error) -> AppError {
    AppError::Internal(format!("metrics: {}", e))
}

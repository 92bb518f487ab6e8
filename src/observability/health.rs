//! 健康检查

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::cache::Cache;
use crate::observability::metrics::AppMetrics;
use crate::storage::Repositories;

/// 健康检查状态
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub uptime_seconds: f64,
    pub checks: Vec<HealthCheck>,
}

/// 单个健康检查项
#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
    pub message: Option<String>,
    pub latency_ms: Option<u64>,
}

/// 健康检查结果
#[derive(Debug, Clone)]
pub struct HealthCheckResult {
    pub name: String,
    pub healthy: bool,
    pub message: String,
    pub latency_ms: u64,
    pub checked_at: DateTime<Utc>,
}

/// 可观测性状态
#[derive(Clone)]
pub struct ObservabilityState {
    pub metrics: Arc<AppMetrics>,
    pub health_checks: Arc<Mutex<Vec<HealthCheckResult>>>,
    pub start_time: DateTime<Utc>,
    pub version: String,
}

impl ObservabilityState {
    pub fn new(version: String, metrics: Arc<AppMetrics>) -> Self {
        Self {
            metrics,
            health_checks: Arc::new(Mutex::new(Vec::new())),
            start_time: Utc::now(),
            version,
        }
    }

    /// 记录健康检查结果，同名检查只保留最新一次
    pub async fn record_health_check(&self, result: HealthCheckResult) {
        let mut checks = self.health_checks.lock().await;
        match checks.iter_mut().find(|c| c.name == result.name) {
            Some(existing) => *existing = result,
            None => checks.push(result),
        }
    }

    pub async fn is_healthy(&self) -> bool {
        self.health_checks.lock().await.iter().all(|c| c.healthy)
    }

    /// 获取应用正常运行时间
    pub fn uptime_seconds(&self) -> f64 {
        (Utc::now() - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}

async fn timed<F, E>(name: &str, check: F) -> HealthCheckResult
where
    F: std::future::Future<Output = std::result::Result<(), E>>,
    E: std::fmt::Display,
{
    let start = Instant::now();
    let outcome = check.await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (healthy, message) = match outcome {
        Ok(()) => (true, "ok".to_string()),
        Err(e) => {
            warn!(check = name, error = %e, "健康检查失败");
            (false, e.to_string())
        }
    };

    HealthCheckResult {
        name: name.to_string(),
        healthy,
        message,
        latency_ms,
        checked_at: Utc::now(),
    }
}

/// 执行一轮存储与缓存检查
pub async fn run_health_checks(
    state: &ObservabilityState,
    repositories: &Repositories,
    cache: &dyn Cache,
) {
    let storage = timed("storage", repositories.health_check()).await;
    state.record_health_check(storage).await;

    let cache_check = timed("cache", cache.ping()).await;
    state.record_health_check(cache_check).await;
}

/// 后台定期刷新健康检查
pub fn spawn_health_checker(
    state: Arc<ObservabilityState>,
    repositories: Repositories,
    cache: Arc<dyn Cache>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            run_health_checks(&state, &repositories, cache.as_ref()).await;
        }
    })
}

/// 获取完整健康状态
pub async fn health_check(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    let checks = state.health_checks.lock().await;
    let all_healthy = checks.iter().all(|c| c.healthy);

    let health_status = HealthStatus {
        status: if all_healthy { "healthy" } else { "unhealthy" }.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
        checks: checks
            .iter()
            .map(|c| HealthCheck {
                name: c.name.clone(),
                status: if c.healthy { "healthy" } else { "unhealthy" }.to_string(),
                message: Some(c.message.clone()),
                latency_ms: Some(c.latency_ms),
            })
            .collect(),
    };

    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health_status))
}

/// 简单存活检查
pub async fn liveness() -> impl IntoResponse {
    "OK"
}

/// 就绪检查（依赖服务）
pub async fn readiness(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    if state.is_healthy().await {
        (StatusCode::OK, "Ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Not Ready")
    }
}

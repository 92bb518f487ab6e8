//! Rate Limiting Module
//!
//! Sliding-window limiter for the credential endpoints (login / register).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::config::SecurityConfig;

/// Rate limit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum requests per minute
    pub requests_per_minute: u32,
    /// Maximum requests per hour
    pub requests_per_hour: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 10,
            requests_per_hour: 100,
        }
    }
}

/// Rate limit result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed { remaining: u32 },
    /// Request is rate limited
    Limited {
        /// Seconds until retry is allowed
        retry_after: u64,
        /// Window that was exceeded
        window: String,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Client identifier for rate limiting
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum RateLimitClient {
    /// IP address based client
    Ip(String),
    /// Anything else that identifies the caller
    Custom(String),
}

impl RateLimitClient {
    pub fn from_ip(ip: &str) -> Self {
        RateLimitClient::Ip(ip.to_string())
    }

    pub fn as_str(&self) -> &str {
        match self {
            RateLimitClient::Ip(s) => s.as_str(),
            RateLimitClient::Custom(s) => s.as_str(),
        }
    }

    /// Resolve the caller from the peer address; proxy headers count only when trusted
    pub fn from_request<B>(req: &axum::http::Request<B>, trust_proxy_headers: bool) -> Self {
        if trust_proxy_headers {
            if let Some(ip) = forwarded_ip(req.headers()) {
                return RateLimitClient::from_ip(ip);
            }
        }

        if let Some(connect_info) = req
            .extensions()
            .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        {
            return RateLimitClient::from_ip(&connect_info.0.ip().to_string());
        }

        RateLimitClient::Custom("anonymous".to_string())
    }
}

fn forwarded_ip(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("X-Real-IP").and_then(|v| v.to_str().ok()))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Tracked clients before idle entries are swept
const SWEEP_THRESHOLD: usize = 1024;

/// In-memory rate limiter using sliding window
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    /// Request history (client -> timestamps)
    request_history: Arc<RwLock<HashMap<String, Vec<DateTime<Utc>>>>>,
    enabled: bool,
    trust_proxy_headers: bool,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, enabled: bool) -> Self {
        Self {
            config,
            request_history: Arc::new(RwLock::new(HashMap::new())),
            enabled,
            trust_proxy_headers: false,
        }
    }

    pub fn with_trusted_proxy(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    /// Identify the caller of a request
    pub fn client_for<B>(&self, req: &axum::http::Request<B>) -> RateLimitClient {
        RateLimitClient::from_request(req, self.trust_proxy_headers)
    }

    /// Number of clients currently tracked
    pub async fn tracked_clients(&self) -> usize {
        self.request_history.read().await.len()
    }

    /// Disabled limiter, every request passes
    pub fn disabled() -> Self {
        Self::new(RateLimitConfig::default(), false)
    }

    pub fn from_settings(settings: &SecurityConfig) -> Self {
        let config = RateLimitConfig {
            requests_per_minute: settings.auth_requests_per_minute,
            requests_per_hour: settings.auth_requests_per_hour,
        };
        Self::new(config, settings.rate_limit_enabled)
            .with_trusted_proxy(settings.trust_proxy_headers)
    }

    /// Check rate limit for a client and record the request when allowed
    pub async fn check_rate_limit(&self, client: &RateLimitClient) -> RateLimitResult {
        if !self.enabled {
            return RateLimitResult::Allowed {
                remaining: self.config.requests_per_minute,
            };
        }

        let client_id = client.as_str();
        let now = Utc::now();
        let minute_cutoff = now - Duration::minutes(1);
        let hour_cutoff = now - Duration::hours(1);

        let mut history = self.request_history.write().await;
        if history.len() >= SWEEP_THRESHOLD {
            history.retain(|_, times| times.iter().any(|t| *t > hour_cutoff));
        }
        let entries = history.entry(client_id.to_string()).or_default();
        entries.retain(|t| *t > hour_cutoff);

        let minute_count = entries.iter().filter(|t| **t > minute_cutoff).count() as u32;
        let hour_count = entries.len() as u32;

        if minute_count >= self.config.requests_per_minute {
            return RateLimitResult::Limited {
                retry_after: 60,
                window: "minute".to_string(),
            };
        }

        if hour_count >= self.config.requests_per_hour {
            return RateLimitResult::Limited {
                retry_after: 3600,
                window: "hour".to_string(),
            };
        }

        entries.push(now);

        RateLimitResult::Allowed {
            remaining: self.config.requests_per_minute - minute_count - 1,
        }
    }
}

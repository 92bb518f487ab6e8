//! 采集 HTTP 客户端
//!
//! 严格串行：两次请求之间至少间隔固定的延迟。

use reqwest::Client;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::debug;

use crate::config::config::ScraperConfig;
use crate::error::{AppError, Result};

pub struct FetchClient {
    client: Client,
    delay: Duration,
    /// 上一次请求完成的时间
    last_request: Mutex<Option<Instant>>,
}

impl FetchClient {
    pub fn new(user_agent: &str, timeout: Duration, delay: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self {
            client,
            delay,
            last_request: Mutex::new(None),
        })
    }

    pub fn from_config(config: &ScraperConfig) -> Result<Self> {
        Self::new(
            &config.user_agent,
            Duration::from_secs(config.timeout_seconds.max(1)),
            Duration::from_millis(config.delay_ms),
        )
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// GET 页面正文，非 2xx 返回 `Scrape` 错误
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            sleep_until(previous + self.delay).await;
        }

        debug!(url, "GET");
        let result = self.client.get(url).send().await;
        *last = Some(Instant::now());

        let response = result?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Scrape(format!("{} 返回 HTTP {}", url, status)));
        }
        Ok(response.text().await?)
    }
}

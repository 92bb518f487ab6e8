use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 存储后端类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// SurrealDB 文档库
    #[default]
    Surrealdb,
    /// 进程内存储（开发/测试）
    Memory,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 存储后端
    pub backend: StorageBackend,
    /// SurrealDB 连接地址（ws://, mem://）
    pub url: String,
    /// 命名空间
    pub namespace: String,
    /// 数据库名称
    pub database: String,
    /// 用户名
    pub username: String,
    /// 密码
    pub password: String,
    /// 连接超时（秒）
    pub connection_timeout: u64,
}

/// 缓存配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// 是否启用缓存
    pub enabled: bool,
    /// Redis 地址
    pub redis_url: String,
    /// 缓存键前缀
    pub key_prefix: String,
    /// 默认过期时间（秒）
    pub ttl_seconds: u64,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务地址
    pub host: String,
    /// 服务端口
    pub port: u16,
    /// 请求超时（秒）
    pub request_timeout: u64,
    /// 最大请求体大小（字节）
    pub max_request_size: usize,
    /// CORS 允许的来源
    pub cors_allowed_origins: Vec<String>,
}

/// 安全配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SecurityConfig {
    /// JWT 签名密钥
    pub jwt_secret: String,
    /// JWT 签发者
    pub jwt_issuer: String,
    /// JWT 受众
    pub jwt_audience: String,
    /// JWT 有效期（秒）
    pub jwt_expiry_seconds: u64,
    /// 第一个注册的用户自动成为管理员
    pub first_user_admin: bool,
    /// PBKDF2 迭代次数
    pub password_iterations: u32,
    /// 是否启用登录限流
    pub rate_limit_enabled: bool,
    /// 登录接口每分钟请求数
    pub auth_requests_per_minute: u32,
    /// 登录接口每小时请求数
    pub auth_requests_per_hour: u32,
    /// 部署在反向代理之后时才信任 X-Forwarded-For / X-Real-IP
    pub trust_proxy_headers: bool,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 结构化日志格式
    pub structured: bool,
    /// 日志文件目录
    pub log_dir: Option<PathBuf>,
    /// 日志文件名前缀
    pub file_prefix: String,
}

/// 上传配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UploadConfig {
    /// 图片存储目录
    pub dir: PathBuf,
    /// 对外访问路径前缀
    pub public_path: String,
    /// 单个图片最大字节数
    pub max_image_bytes: usize,
}

/// 采集脚本配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScraperConfig {
    /// User-Agent
    pub user_agent: String,
    /// 两次请求之间的固定间隔（毫秒）
    pub delay_ms: u64,
    /// 请求超时（秒）
    pub timeout_seconds: u64,
    /// gundam.fandom.com 根地址
    pub fandom_base_url: String,
    /// gunpladb.net 根地址
    pub gunpladb_base_url: String,
    /// mechabay.com 根地址
    pub mechabay_base_url: String,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 数据库配置
    pub database: DatabaseConfig,
    /// 缓存配置
    pub cache: CacheConfig,
    /// 服务器配置
    pub server: ServerConfig,
    /// 安全配置
    pub security: SecurityConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 上传配置
    pub upload: UploadConfig,
    /// 采集配置
    pub scraper: ScraperConfig,
    /// 应用名称
    pub app_name: String,
    /// 环境
    pub environment: String,
}

impl AppConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            database: DatabaseConfig {
                backend: StorageBackend::Surrealdb,
                url: "ws://localhost:8000".into(),
                namespace: "gundam".into(),
                database: "codex".into(),
                username: "root".into(),
                password: "root".into(),
                connection_timeout: 30,
            },
            cache: CacheConfig {
                enabled: true,
                redis_url: "redis://localhost:6379".into(),
                key_prefix: "codex".into(),
                ttl_seconds: 300,
            },
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: 8080,
                request_timeout: 30,
                max_request_size: 10 * 1024 * 1024,
                cors_allowed_origins: vec!["http://localhost:3000".into()],
            },
            security: SecurityConfig {
                jwt_secret: "dev-secret-change-in-production-min-32-chars".into(),
                jwt_issuer: "gundam-codex".into(),
                jwt_audience: "gundam-codex-api".into(),
                jwt_expiry_seconds: 60 * 60 * 24,
                first_user_admin: true,
                password_iterations: 100_000,
                rate_limit_enabled: false,
                auth_requests_per_minute: 10,
                auth_requests_per_hour: 100,
                trust_proxy_headers: false,
            },
            logging: LoggingConfig {
                level: "debug".into(),
                structured: false,
                log_dir: None,
                file_prefix: "gundam-codex.log".into(),
            },
            upload: UploadConfig {
                dir: PathBuf::from("./data/uploads"),
                public_path: "/uploads".into(),
                max_image_bytes: 5 * 1024 * 1024,
            },
            scraper: ScraperConfig {
                user_agent: "gundam-codex-scraper/0.1".into(),
                delay_ms: 1500,
                timeout_seconds: 20,
                fandom_base_url: "https://gundam.fandom.com".into(),
                gunpladb_base_url: "https://www.gunpladb.net".into(),
                mechabay_base_url: "https://mechabay.com".into(),
            },
            app_name: "gundam-codex".into(),
            environment: "development".into(),
        }
    }

    /// 创建生产环境配置
    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = "production".into();
        config.logging.level = "info".into();
        config.logging.structured = true;
        config.logging.log_dir = Some(PathBuf::from("./logs"));
        config.security.rate_limit_enabled = true;
        config.security.first_user_admin = false;
        config
    }

    /// 测试用配置：内存存储，关闭缓存，降低哈希成本
    pub fn testing() -> Self {
        let mut config = Self::development();
        config.environment = "test".into();
        config.database.backend = StorageBackend::Memory;
        config.cache.enabled = false;
        config.security.password_iterations = 1_000;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

//! 服务模块
//!
//! 业务规则层：位于存储与 API 之间。

pub mod analytics;
pub mod auth;
pub mod content;
pub mod settings;
pub mod timeline;
pub mod upload;
pub mod users;

pub use analytics::{AnalyticsService, DashboardStats, EraEvents, GrowthPoint};
pub use auth::{AuthService, Registration, Session};
pub use content::ContentService;
pub use settings::{SettingsChanges, SettingsService};
pub use timeline::{EventChanges, TimelineService};
pub use upload::{ImageFormat, ImageStore};
pub use users::{UserChanges, UserService};

//! 核心数据模型模块
//!
//! 定义百科的文档结构：势力、模型商品、百科机体、人物、时间线、用户与站点设置。

pub mod common;
pub mod faction;
pub mod lore_character;
pub mod lore_mobile_suit;
pub mod mobile_suit;
pub mod settings;
pub mod timeline;
pub mod user;

pub use common::{ArmamentGroup, SpecEntry, SpecTable};
pub use faction::{Faction, Force};
pub use lore_character::LoreCharacter;
pub use lore_mobile_suit::LoreMobileSuit;
pub use mobile_suit::{Grade, MobileSuit};
pub use settings::SiteSettings;
pub use timeline::{Timeline, TimelineEvent};
pub use user::User;

use std::sync::Arc;

use crate::cache::{Cache, ReadThrough};
use crate::config::AppConfig;
use crate::models::{Faction, LoreCharacter, LoreMobileSuit, MobileSuit};
use crate::observability::AppMetrics;
use crate::security::auth::{Authenticator, JwtAuth};
use crate::security::rate_limit::RateLimiter;
use crate::security::rbac::{Authorizer, SimpleAuthorizer};
use crate::services::{
    AnalyticsService, AuthService, ContentService, ImageStore, SettingsService, TimelineService,
    UserService,
};
use crate::storage::Repositories;

/// Application state containing all shared services and security components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Gunpla product catalog
    pub mobile_suits: ContentService<MobileSuit>,
    /// Encyclopedia mobile suit entries
    pub lore: ContentService<LoreMobileSuit>,
    pub characters: ContentService<LoreCharacter>,
    pub factions: ContentService<Faction>,
    pub timelines: TimelineService,
    pub auth: Arc<AuthService>,
    pub users: UserService,
    pub analytics: AnalyticsService,
    pub settings: SettingsService,
    pub images: ImageStore,
    /// Authenticator for JWT validation
    pub authenticator: Arc<dyn Authenticator>,
    /// Authorizer for RBAC permission checks
    pub authorizer: Arc<dyn Authorizer>,
    /// Rate limiter for login and registration
    pub rate_limiter: Arc<RateLimiter>,
    pub metrics: Arc<AppMetrics>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("environment", &self.config.environment)
            .field("images", &self.images)
            .field("authenticator", &self.authenticator.authenticator_type())
            .field("authorizer", &"Arc<dyn Authorizer>")
            .field("rate_limiter", &self.rate_limiter)
            .finish()
    }
}

impl AppState {
    /// Wire services over the given storage and cache handles
    pub fn from_parts(
        config: AppConfig,
        repositories: Repositories,
        cache: Arc<dyn Cache>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        let read_through = ReadThrough::new(cache, &config.cache).with_metrics(metrics.clone());

        Self {
            mobile_suits: ContentService::new(repositories.mobile_suits.clone(), read_through.clone()),
            lore: ContentService::new(repositories.lore.clone(), read_through.clone()),
            characters: ContentService::new(repositories.characters.clone(), read_through.clone()),
            factions: ContentService::new(repositories.factions.clone(), read_through.clone()),
            timelines: TimelineService::new(ContentService::new(
                repositories.timelines.clone(),
                read_through.clone(),
            )),
            auth: Arc::new(AuthService::new(repositories.users.clone(), &config.security)),
            users: UserService::new(repositories.users.clone()),
            settings: SettingsService::new(repositories.settings.clone(), read_through),
            analytics: AnalyticsService::new(repositories),
            images: ImageStore::new(&config.upload),
            authenticator: Arc::new(JwtAuth::from_config(&config.security)),
            authorizer: Arc::new(SimpleAuthorizer::new()),
            rate_limiter: Arc::new(RateLimiter::from_settings(&config.security)),
            metrics,
            config: Arc::new(config),
        }
    }
}

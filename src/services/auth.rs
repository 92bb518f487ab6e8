//! 认证服务
//!
//! 注册、登录、当前用户与令牌刷新。

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::config::SecurityConfig;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::models::user::login_key;
use crate::security::auth::{AuthToken, Claims, JwtTokenGenerator};
use crate::security::password::PasswordHasher;
use crate::security::rbac::Role;
use crate::security::validation::validators;
use crate::storage::repository::{ListQuery, Repository};

/// 注册信息
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// 登录结果
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: AuthToken,
}

pub struct AuthService {
    users: Arc<dyn Repository<User>>,
    hasher: PasswordHasher,
    tokens: JwtTokenGenerator,
    first_user_admin: bool,
    /// 注册串行化，保证唯一性检查与“首个用户”判断不被并发打破
    register_lock: Mutex<()>,
}

impl AuthService {
    pub fn new(users: Arc<dyn Repository<User>>, config: &SecurityConfig) -> Self {
        Self {
            users,
            hasher: PasswordHasher::new(config.password_iterations),
            tokens: JwtTokenGenerator::from_config(config),
            first_user_admin: config.first_user_admin,
            register_lock: Mutex::new(()),
        }
    }

    pub fn hasher(&self) -> PasswordHasher {
        self.hasher
    }

    pub async fn register(&self, registration: Registration) -> Result<Session> {
        let username = registration.username.trim().to_string();
        let email = registration.email.trim().to_lowercase();

        validators::validate_username(&username)?;
        validators::validate_email(&email)?;
        validators::validate_password(&registration.password)?;

        let _guard = self.register_lock.lock().await;

        if self.users.find_by_field("login_key", &login_key(&username)).await?.is_some() {
            return Err(AppError::Conflict(format!("用户名 {} 已被使用", username)));
        }
        if self.users.find_by_field("email", &email).await?.is_some() {
            return Err(AppError::Conflict(format!("邮箱 {} 已被注册", email)));
        }

        let role = if self.first_user_admin && self.users.count(&ListQuery::default()).await? == 0 {
            Role::Admin
        } else {
            Role::User
        };

        let hash = self.hasher.hash(&registration.password)?;
        let mut user = User::new(&username, &email, hash, role);
        user.record_login();
        let user = self.users.create(&user).await?;

        info!(username = %user.username, role = %user.role, "新用户注册");
        let token = self.issue(&user)?;
        Ok(Session { user, token })
    }

    /// 用户名或邮箱登录，不区分大小写；两种失败返回同一条消息
    pub async fn login(&self, login: &str, password: &str) -> Result<Session> {
        let login = login.trim();
        let invalid = || AppError::Authentication("用户名或密码错误".to_string());
        if login.is_empty() {
            return Err(invalid());
        }

        let mut user = match self.users.find_by_field("login_key", &login_key(login)).await? {
            Some(user) => user,
            None if login.contains('@') => self
                .users
                .find_by_field("email", &login.to_lowercase())
                .await?
                .ok_or_else(invalid)?,
            None => return Err(invalid()),
        };

        if !self.hasher.verify(password, &user.password_hash)? {
            warn!(username = %user.username, "登录失败：密码错误");
            return Err(invalid());
        }

        user.record_login();
        let user = self
            .users
            .update(&user.id.clone(), &user)
            .await?
            .ok_or_else(invalid)?;

        info!(username = %user.username, "用户登录");
        let token = self.issue(&user)?;
        Ok(Session { user, token })
    }

    /// 当前令牌对应的用户
    pub async fn me(&self, claims: &Claims) -> Result<User> {
        self.users
            .get_by_id(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Authentication("用户不存在或已被删除".to_string()))
    }

    /// 以用户当前的角色签发新令牌
    pub async fn refresh(&self, claims: &Claims) -> Result<Session> {
        let user = self.me(claims).await?;
        let token = self.issue(&user)?;
        Ok(Session { user, token })
    }

    fn issue(&self, user: &User) -> Result<AuthToken> {
        self.tokens
            .generate_token(&user.id, &user.username, &user.role.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::security::auth::{Authenticator, JwtAuth};
    use crate::storage::memory::MemoryRepository;

    fn service(first_user_admin: bool) -> AuthService {
        let mut config = AppConfig::testing().security;
        config.first_user_admin = first_user_admin;
        AuthService::new(Arc::new(MemoryRepository::<User>::new()), &config)
    }

    fn registration(username: &str, email: &str) -> Registration {
        Registration {
            username: username.into(),
            email: email.into(),
            password: "whitebase79".into(),
        }
    }

    #[tokio::test]
    async fn test_first_user_becomes_admin() {
        let service = service(true);
        let first = service.register(registration("bright", "bright@ef.gov")).await.unwrap();
        let second = service.register(registration("amuro", "amuro@ef.gov")).await.unwrap();

        assert_eq!(first.user.role, Role::Admin);
        assert_eq!(second.user.role, Role::User);
    }

    #[tokio::test]
    async fn test_no_admin_without_flag() {
        let service = service(false);
        let first = service.register(registration("bright", "bright@ef.gov")).await.unwrap();
        assert_eq!(first.user.role, Role::User);
    }

    #[tokio::test]
    async fn test_duplicate_username_or_email_conflicts() {
        let service = service(true);
        service.register(registration("char", "char@zeon.org")).await.unwrap();

        assert!(matches!(
            service.register(registration("char", "other@zeon.org")).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            service.register(registration("quattro", "CHAR@zeon.org")).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_username_ignores_case() {
        let service = service(true);
        service.register(registration("Amuro", "amuro@ef.gov")).await.unwrap();

        assert!(matches!(
            service.register(registration("amuro", "ray@ef.gov")).await,
            Err(AppError::Conflict(_))
        ));

        let session = service.login("AMURO", "whitebase79").await.unwrap();
        assert_eq!(session.user.username, "Amuro");
    }

    #[tokio::test]
    async fn test_weak_password_rejected() {
        let service = service(true);
        let mut reg = registration("kamille", "kamille@aeug.org");
        reg.password = "short".into();
        assert!(matches!(service.register(reg).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_login_issues_valid_token() {
        let service = service(true);
        service.register(registration("amuro", "amuro@ef.gov")).await.unwrap();

        let session = service.login("amuro@EF.gov", "whitebase79").await.unwrap();
        assert!(session.user.last_login_at.is_some());

        let claims = JwtAuth::from_config(&AppConfig::testing().security)
            .validate_token(&session.token.token)
            .await
            .unwrap();
        assert_eq!(claims.sub, session.user.id);
        assert_eq!(service.me(&claims).await.unwrap().username, "amuro");
        assert!(service.refresh(&claims).await.is_ok());
    }

    #[tokio::test]
    async fn test_login_failures_look_the_same() {
        let service = service(true);
        service.register(registration("amuro", "amuro@ef.gov")).await.unwrap();

        let wrong_password = service.login("amuro", "wrong-pass1").await.unwrap_err();
        let unknown_user = service.login("hathaway", "whatever1").await.unwrap_err();
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert!(matches!(wrong_password, AppError::Authentication(_)));
    }
}

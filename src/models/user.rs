use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::security::rbac::Role;
use crate::storage::repository::Document;

/// 用户
///
/// `password_hash` 会写入存储，但不会出现在任何 API 响应中。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// 登录名，保留注册时的大小写
    pub username: String,
    /// 小写登录名，业务唯一键，登录时按它查找
    #[serde(default)]
    pub login_key: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: &str, email: &str, password_hash: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.trim().to_string(),
            login_key: login_key(username),
            email: email.trim().to_lowercase(),
            password_hash,
            role,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// 记录登录时间
    pub fn record_login(&mut self) {
        let now = Utc::now();
        self.last_login_at = Some(now);
        self.updated_at = now;
    }
}

/// 用户名的比较形式
pub fn login_key(username: &str) -> String {
    username.trim().to_lowercase()
}

impl Document for User {
    const COLLECTION: &'static str = "user";
    const NATURAL_KEY: &'static str = "login_key";
    const SEARCH_FIELDS: &'static [&'static str] = &["username", "email"];
    const SORT_FIELD: &'static str = "username";

    fn id(&self) -> &str {
        &self.id
    }

    fn natural_key(&self) -> String {
        self.login_key.clone()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn set_identity(&mut self, id: &str, created_at: DateTime<Utc>) {
        self.id = id.to_string();
        self.created_at = created_at;
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new_normalizes_email() {
        let user = User::new(" Amuro ", " Amuro@WhiteBase.EF ", "hash".into(), Role::User);
        assert_eq!(user.username, "Amuro");
        assert_eq!(user.natural_key(), "amuro");
        assert_eq!(user.email, "amuro@whitebase.ef");
        assert!(!user.is_admin());
        assert!(user.last_login_at.is_none());
    }

    #[test]
    fn test_record_login() {
        let mut user = User::new("bright", "bright@ef.gov", "hash".into(), Role::Admin);
        user.record_login();
        assert!(user.last_login_at.is_some());
        assert!(user.is_admin());
    }
}

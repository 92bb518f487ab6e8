//! 用户管理服务（后台）

use std::sync::Arc;
use tracing::info;

use crate::error::{AppError, Result};
use crate::models::User;
use crate::security::auth::Claims;
use crate::security::rbac::Role;
use crate::security::validation::validators;
use crate::storage::repository::{Document, ListQuery, Page, Repository};

/// 管理员可修改的用户字段
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub role: Option<Role>,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn Repository<User>>,
}

impl UserService {
    pub fn new(users: Arc<dyn Repository<User>>) -> Self {
        Self { users }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Page<User>> {
        let items = self.users.list(query).await?;
        let total = self.users.count(query).await?;
        Ok(Page::new(items, total, query.pagination))
    }

    pub async fn get(&self, id: &str) -> Result<User> {
        self.users
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))
    }

    pub async fn update(&self, actor: &Claims, id: &str, changes: UserChanges) -> Result<User> {
        let mut user = self.get(id).await?;

        if let Some(email) = changes.email {
            let email = email.trim().to_lowercase();
            validators::validate_email(&email)?;
            if let Some(other) = self.users.find_by_field("email", &email).await? {
                if other.id != user.id {
                    return Err(AppError::Conflict(format!("邮箱 {} 已被注册", email)));
                }
            }
            user.email = email;
        }

        if let Some(role) = changes.role {
            if actor.sub == user.id && user.is_admin() && !role.is_admin() {
                return Err(AppError::Validation("不能撤销自己的管理员权限".to_string()));
            }
            user.role = role;
        }

        user.touch();
        let updated = self
            .users
            .update(id, &user)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))?;

        info!(actor = %actor.username, user = %updated.username, role = %updated.role, "用户已更新");
        Ok(updated)
    }

    pub async fn delete(&self, actor: &Claims, id: &str) -> Result<()> {
        if actor.sub == id {
            return Err(AppError::Validation("不能删除自己的账号".to_string()));
        }
        if !self.users.delete(id).await? {
            return Err(AppError::NotFound(format!("user {}", id)));
        }

        info!(actor = %actor.username, user_id = id, "用户已删除");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryRepository;

    async fn setup() -> (UserService, User, User) {
        let repo = Arc::new(MemoryRepository::<User>::new());
        let admin = User::new("bright", "bright@ef.gov", "h".into(), Role::Admin);
        let user = User::new("amuro", "amuro@ef.gov", "h".into(), Role::User);
        repo.create(&admin).await.unwrap();
        repo.create(&user).await.unwrap();
        (UserService::new(repo), admin, user)
    }

    fn claims_for(user: &User) -> Claims {
        Claims::new(
            user.id.clone(),
            user.username.clone(),
            user.role.to_string(),
            60,
            "gundam-codex".into(),
            "gundam-codex-api".into(),
        )
    }

    #[tokio::test]
    async fn test_promote_and_change_email() {
        let (service, admin, user) = setup().await;
        let updated = service
            .update(
                &claims_for(&admin),
                &user.id,
                UserChanges {
                    email: Some("Amuro@Londo.Bell".into()),
                    role: Some(Role::Admin),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email, "amuro@londo.bell");
        assert!(updated.is_admin());
    }

    #[tokio::test]
    async fn test_admin_cannot_demote_or_delete_self() {
        let (service, admin, _) = setup().await;
        let claims = claims_for(&admin);

        let demote = service
            .update(
                &claims,
                &admin.id,
                UserChanges {
                    role: Some(Role::User),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(demote, Err(AppError::Validation(_))));
        assert!(matches!(
            service.delete(&claims, &admin.id).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_email_conflict_and_delete() {
        let (service, admin, user) = setup().await;
        let claims = claims_for(&admin);

        let result = service
            .update(
                &claims,
                &user.id,
                UserChanges {
                    email: Some("bright@ef.gov".into()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        service.delete(&claims, &user.id).await.unwrap();
        assert!(matches!(service.get(&user.id).await, Err(AppError::NotFound(_))));
    }
}

//! Role-Based Access Control (RBAC) Module
//!
//! Provides authorization through role-based permissions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::security::auth::Claims;

/// Role enumeration for access control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Back-office administrator
    Admin,
    /// Registered reader
    #[default]
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
        }
    }
}

impl Role {
    /// Convert from string to Role, unknown roles fall back to `User`
    pub fn from_string(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "admin" | "administrator" => Role::Admin,
            _ => Role::User,
        }
    }

    /// Check if role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Resource types that can be protected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    /// Gunpla product catalog
    MobileSuit,
    /// Encyclopedia mobile suit entries
    Lore,
    /// Pilots and other characters
    Character,
    Faction,
    Timeline,
    /// User accounts
    User,
    /// Dashboards and aggregate numbers
    Analytics,
    /// Site settings
    Settings,
    /// All resources wildcard
    All,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceType::MobileSuit => "mobile_suit",
            ResourceType::Lore => "lore",
            ResourceType::Character => "character",
            ResourceType::Faction => "faction",
            ResourceType::Timeline => "timeline",
            ResourceType::User => "user",
            ResourceType::Analytics => "analytics",
            ResourceType::Settings => "settings",
            ResourceType::All => "all",
        };
        write!(f, "{}", name)
    }
}

/// Action types that can be performed on resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    Create,
    Read,
    Update,
    Delete,
    /// Upload images and other binary attachments
    Upload,
    /// All actions wildcard
    All,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionType::Create => "create",
            ActionType::Read => "read",
            ActionType::Update => "update",
            ActionType::Delete => "delete",
            ActionType::Upload => "upload",
            ActionType::All => "all",
        };
        write!(f, "{}", name)
    }
}

/// Permission definition combining resource and action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    pub resource: ResourceType,
    pub action: ActionType,
}

impl Permission {
    pub fn new(resource: ResourceType, action: ActionType) -> Self {
        Self { resource, action }
    }

    /// Check if this permission matches another (allowing wildcards)
    pub fn matches(&self, other: &Permission) -> bool {
        let resource_match = self.resource == ResourceType::All
            || other.resource == ResourceType::All
            || self.resource == other.resource;

        let action_match = self.action == ActionType::All
            || other.action == ActionType::All
            || self.action == other.action;

        resource_match && action_match
    }
}

/// Default permissions for each role
pub fn get_default_permissions(role: &Role) -> Vec<Permission> {
    match role {
        Role::Admin => vec![Permission::new(ResourceType::All, ActionType::All)],
        Role::User => vec![
            // Public content is readable by everyone
            Permission::new(ResourceType::MobileSuit, ActionType::Read),
            Permission::new(ResourceType::Lore, ActionType::Read),
            Permission::new(ResourceType::Character, ActionType::Read),
            Permission::new(ResourceType::Faction, ActionType::Read),
            Permission::new(ResourceType::Timeline, ActionType::Read),
            Permission::new(ResourceType::Settings, ActionType::Read),
        ],
    }
}

/// Authorizer trait for checking permissions
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Check if a subject has permission to perform an action
    async fn check_permission(&self, claims: &Claims, permission: &Permission) -> bool;
    /// Get all permissions for a role
    async fn get_role_permissions(&self, role: &Role) -> Vec<Permission>;
}

/// Simple in-memory authorizer implementation
#[derive(Debug, Clone)]
pub struct SimpleAuthorizer {
    permissions: Vec<(Role, Vec<Permission>)>,
}

impl SimpleAuthorizer {
    /// Create new authorizer with default permissions
    pub fn new() -> Self {
        let permissions = vec![
            (Role::Admin, get_default_permissions(&Role::Admin)),
            (Role::User, get_default_permissions(&Role::User)),
        ];

        Self { permissions }
    }
}

impl Default for SimpleAuthorizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authorizer for SimpleAuthorizer {
    async fn check_permission(&self, claims: &Claims, permission: &Permission) -> bool {
        let role = Role::from_string(&claims.role);

        if role.is_admin() {
            return true;
        }

        self.permissions
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, perms)| perms.iter().any(|p| p.matches(permission)))
            .unwrap_or(false)
    }

    async fn get_role_permissions(&self, role: &Role) -> Vec<Permission> {
        self.permissions
            .iter()
            .find(|(r, _)| r == role)
            .map(|(_, perms)| perms.clone())
            .unwrap_or_else(|| get_default_permissions(role))
    }
}

/// Claims extension trait for authorization helpers
pub trait ClaimsExt {
    fn role(&self) -> Role;
    fn is_admin(&self) -> bool;
    /// Admins may act on anyone; users only on themselves
    fn can_act_on_user(&self, user_id: &str) -> bool;
}

impl ClaimsExt for Claims {
    fn role(&self) -> Role {
        Role::from_string(&self.role)
    }

    fn is_admin(&self) -> bool {
        self.role().is_admin()
    }

    fn can_act_on_user(&self, user_id: &str) -> bool {
        self.is_admin() || self.sub == user_id
    }
}

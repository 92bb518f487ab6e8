//! Security Module
//!
//! Security features for the Gundam Codex API:
//! - Authentication (JWT bearer tokens)
//! - Authorization (RBAC)
//! - Password hashing
//! - Rate Limiting
//! - Request Validation
//! - Security Middleware

pub mod auth;
pub mod middleware;
pub mod password;
pub mod rate_limit;
pub mod rbac;
pub mod validation;

pub use auth::{AuthToken, Authenticator, Claims, Credentials, JwtAuth, JwtTokenGenerator};
pub use password::PasswordHasher;
pub use rate_limit::{RateLimitClient, RateLimitConfig, RateLimitResult, RateLimiter};
pub use rbac::{ActionType, Authorizer, ClaimsExt, Permission, ResourceType, Role, SimpleAuthorizer};
pub use validation::{RequestValidator, Validatable, ValidationError};

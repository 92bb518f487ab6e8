//! Authentication Module
//!
//! Bearer-token (JWT) authentication for the back office and signed-in readers.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::config::SecurityConfig;
use crate::error::{AppError, Result};

/// Credentials for authentication
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// JWT token (if provided)
    pub bearer_token: Option<String>,
}

impl Credentials {
    pub fn new(bearer_token: Option<String>) -> Self {
        Self { bearer_token }
    }

    /// Try to extract credentials from Authorization header
    pub fn from_authorization_header(auth_header: Option<&str>) -> Self {
        match auth_header {
            Some(header) if header.len() > 7 && header[..7].eq_ignore_ascii_case("bearer ") => {
                Self::new(Some(header[7..].trim().to_string()))
            }
            _ => Self::new(None),
        }
    }
}

/// Authentication token result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken {
    /// The token string
    pub token: String,
    /// Token expiration time
    pub expires_at: DateTime<Utc>,
}

impl AuthToken {
    pub fn new(token: String, expires_at: DateTime<Utc>) -> Self {
        Self { token, expires_at }
    }

    /// Check if token is expired
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Username at the time the token was issued
    pub username: String,
    /// User role
    pub role: String,
    /// Token expiration timestamp
    pub exp: usize,
    /// Token not before timestamp
    pub nbf: usize,
    /// Issued at timestamp
    pub iat: usize,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Unique token ID
    pub jti: String,
}

impl Claims {
    pub fn new(
        sub: String,
        username: String,
        role: String,
        expiry_seconds: u64,
        issuer: String,
        audience: String,
    ) -> Self {
        let now = Utc::now().timestamp() as usize;

        Self {
            sub,
            username,
            role,
            exp: now + expiry_seconds as usize,
            nbf: now,
            iat: now,
            iss: issuer,
            aud: audience,
            jti: Uuid::new_v4().to_string(),
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp as i64, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// Authentication trait for different authentication methods
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authenticate credentials and return claims
    async fn authenticate(&self, credentials: &Credentials) -> Result<Claims>;
    /// Validate a token and return claims
    async fn validate_token(&self, token: &str) -> Result<Claims>;
    /// Get the authenticator type
    fn authenticator_type(&self) -> &'static str;
}

/// JWT based authentication
#[derive(Clone)]
pub struct JwtAuth {
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
}

impl std::fmt::Debug for JwtAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuth")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

impl JwtAuth {
    pub fn new(secret: &str, issuer: &str, audience: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
            audience: audience.to_string(),
        }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(&config.jwt_secret, &config.jwt_issuer, &config.jwt_audience)
    }
}

#[async_trait]
impl Authenticator for JwtAuth {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Claims> {
        let token = credentials
            .bearer_token
            .as_ref()
            .ok_or_else(|| AppError::Authentication("No bearer token provided".to_string()))?;

        self.validate_token(token).await
    }

    async fn validate_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.clone()]);
        validation.set_audience(&[self.audience.clone()]);
        validation.validate_nbf = true;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| AppError::Authentication(format!("Invalid JWT token: {}", e)))
    }

    fn authenticator_type(&self) -> &'static str {
        "JWT"
    }
}

/// JWT token generation helper
#[derive(Clone)]
pub struct JwtTokenGenerator {
    encoding_key: EncodingKey,
    issuer: String,
    audience: String,
    expiry_seconds: u64,
}

impl JwtTokenGenerator {
    pub fn new(secret: &str, issuer: &str, audience: &str, expiry_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            expiry_seconds,
        }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            &config.jwt_issuer,
            &config.jwt_audience,
            config.jwt_expiry_seconds,
        )
    }

    /// Generate a new JWT token
    pub fn generate_token(&self, sub: &str, username: &str, role: &str) -> Result<AuthToken> {
        let claims = Claims::new(
            sub.to_string(),
            username.to_string(),
            role.to_string(),
            self.expiry_seconds,
            self.issuer.clone(),
            self.audience.clone(),
        );

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Authentication(format!("Failed to generate token: {}", e)))?;

        Ok(AuthToken::new(token, claims.expires_at()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-at-least-32-chars";

    #[test]
    fn test_credentials_from_header() {
        let creds = Credentials::from_authorization_header(Some("Bearer abc.def"));
        assert_eq!(creds.bearer_token.as_deref(), Some("abc.def"));

        let creds = Credentials::from_authorization_header(Some("bearer xyz"));
        assert_eq!(creds.bearer_token.as_deref(), Some("xyz"));

        assert!(Credentials::from_authorization_header(Some("Basic Zm9v")).bearer_token.is_none());
        assert!(Credentials::from_authorization_header(None).bearer_token.is_none());
    }

    #[tokio::test]
    async fn test_generate_and_validate_roundtrip() {
        let generator = JwtTokenGenerator::new(SECRET, "gundam-codex", "gundam-codex-api", 3600);
        let auth = JwtAuth::new(SECRET, "gundam-codex", "gundam-codex-api");

        let token = generator.generate_token("user-1", "amuro", "admin").unwrap();
        assert!(!token.is_expired());

        let claims = auth.validate_token(&token.token).await.unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.username, "amuro");
        assert_eq!(claims.role, "admin");
    }

    #[tokio::test]
    async fn test_rejects_wrong_secret_and_audience() {
        let generator = JwtTokenGenerator::new(SECRET, "gundam-codex", "gundam-codex-api", 3600);
        let token = generator.generate_token("user-1", "amuro", "user").unwrap();

        let wrong_secret = JwtAuth::new("another-secret-that-is-at-least-32-chars", "gundam-codex", "gundam-codex-api");
        assert!(matches!(
            wrong_secret.validate_token(&token.token).await,
            Err(AppError::Authentication(_))
        ));

        let wrong_audience = JwtAuth::new(SECRET, "gundam-codex", "other-api");
        assert!(wrong_audience.validate_token(&token.token).await.is_err());
    }

    #[tokio::test]
    async fn test_authenticate_requires_token() {
        let auth = JwtAuth::new(SECRET, "gundam-codex", "gundam-codex-api");
        let result = auth.authenticate(&Credentials::default()).await;
        assert!(matches!(result, Err(AppError::Authentication(_))));
    }
}

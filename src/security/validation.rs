//! Request Validation Module
//!
//! Input validation and sanitization for request payloads.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AppError;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_.-]+$").expect("valid username regex"));

/// Validation error types
#[derive(Debug, Error, Clone, Serialize, Deserialize, PartialEq)]
pub enum ValidationError {
    #[error("Required field '{field}' is missing")]
    MissingField { field: String },

    #[error("Field '{field}' is too long (max: {max}, got: {got})")]
    TooLong {
        field: String,
        max: usize,
        got: usize,
    },

    #[error("Field '{field}' is too short (min: {min}, got: {got})")]
    TooShort {
        field: String,
        min: usize,
        got: usize,
    },

    #[error("Field '{field}' contains invalid characters: {chars}")]
    InvalidCharacters { field: String, chars: String },

    #[error("Field '{field}' is not a valid email: {value}")]
    InvalidEmail { field: String, value: String },

    #[error("Field '{field}' is not a valid URL: {value}")]
    InvalidUrl { field: String, value: String },

    #[error("Field '{field}' exceeds maximum value: max={max}, got={got}")]
    ExceedsMax { field: String, max: i64, got: i64 },

    #[error("{message}")]
    Custom { field: String, message: String },
}

impl ValidationError {
    pub fn field(&self) -> &str {
        match self {
            Self::MissingField { field } => field.as_str(),
            Self::TooLong { field, .. } => field.as_str(),
            Self::TooShort { field, .. } => field.as_str(),
            Self::InvalidCharacters { field, .. } => field.as_str(),
            Self::InvalidEmail { field, .. } => field.as_str(),
            Self::InvalidUrl { field, .. } => field.as_str(),
            Self::ExceedsMax { field, .. } => field.as_str(),
            Self::Custom { field, .. } => field.as_str(),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// Validation result type
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Request payloads that can check themselves
pub trait Validatable {
    fn validate(&self) -> ValidationResult<()>;
}

/// Request validator implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestValidator;

impl RequestValidator {
    /// Validate field length in characters
    pub fn validate_length(
        field: &str,
        value: &str,
        min: Option<usize>,
        max: Option<usize>,
    ) -> ValidationResult<()> {
        let length = value.chars().count();

        if let Some(min_len) = min {
            if length < min_len {
                return Err(if length == 0 {
                    ValidationError::MissingField {
                        field: field.to_string(),
                    }
                } else {
                    ValidationError::TooShort {
                        field: field.to_string(),
                        min: min_len,
                        got: length,
                    }
                });
            }
        }

        if let Some(max_len) = max {
            if length > max_len {
                return Err(ValidationError::TooLong {
                    field: field.to_string(),
                    max: max_len,
                    got: length,
                });
            }
        }

        Ok(())
    }

    pub fn validate_email(field: &str, value: &str) -> ValidationResult<()> {
        if EMAIL_REGEX.is_match(value) {
            Ok(())
        } else {
            Err(ValidationError::InvalidEmail {
                field: field.to_string(),
                value: value.to_string(),
            })
        }
    }

    /// Only absolute http(s) URLs or site-relative paths are accepted
    pub fn validate_url(field: &str, value: &str) -> ValidationResult<()> {
        let ok = (value.starts_with("http://") || value.starts_with("https://"))
            && value.len() > "https://".len()
            && !value.chars().any(char::is_whitespace)
            || (value.starts_with('/') && !value.starts_with("//"));

        if ok {
            Ok(())
        } else {
            Err(ValidationError::InvalidUrl {
                field: field.to_string(),
                value: value.to_string(),
            })
        }
    }
}

/// Common validation helpers
pub mod validators {
    use super::*;

    /// Display names: factions, suits, characters, eras
    pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
        RequestValidator::validate_length(field, name.trim(), Some(1), Some(200))
    }

    pub fn validate_description(field: &str, text: &str) -> ValidationResult<()> {
        RequestValidator::validate_length(field, text, None, Some(50_000))
    }

    pub fn validate_username(username: &str) -> ValidationResult<()> {
        RequestValidator::validate_length("username", username, Some(3), Some(32))?;
        if USERNAME_REGEX.is_match(username) {
            Ok(())
        } else {
            let invalid: String = username
                .chars()
                .filter(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
                .collect();
            Err(ValidationError::InvalidCharacters {
                field: "username".to_string(),
                chars: invalid,
            })
        }
    }

    pub fn validate_email(email: &str) -> ValidationResult<()> {
        RequestValidator::validate_length("email", email, Some(3), Some(254))?;
        RequestValidator::validate_email("email", email)
    }

    /// At least 8 characters with one letter and one digit
    pub fn validate_password(password: &str) -> ValidationResult<()> {
        RequestValidator::validate_length("password", password, Some(8), Some(128))?;
        let has_letter = password.chars().any(char::is_alphabetic);
        let has_digit = password.chars().any(|c| c.is_ascii_digit());
        if has_letter && has_digit {
            Ok(())
        } else {
            Err(ValidationError::Custom {
                field: "password".to_string(),
                message: "Password must contain at least one letter and one digit".to_string(),
            })
        }
    }

    pub fn validate_search_query(query: &str) -> ValidationResult<()> {
        RequestValidator::validate_length("q", query, None, Some(200))
    }

    pub fn validate_optional_url(field: &str, url: Option<&str>) -> ValidationResult<()> {
        match url {
            Some(url) if !url.trim().is_empty() => RequestValidator::validate_url(field, url.trim()),
            _ => Ok(()),
        }
    }

    pub fn validate_max(field: &str, value: i64, max: i64) -> ValidationResult<()> {
        if value > max {
            Err(ValidationError::ExceedsMax {
                field: field.to_string(),
                max,
                got: value,
            })
        } else {
            Ok(())
        }
    }
}

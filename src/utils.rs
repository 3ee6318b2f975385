use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use rand_core::OsRng;

use crate::errors::AppError;

const MIN_PASSWORD_LENGTH: usize = 8;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::bad_request(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AppError::internal(format!("failed to hash password: {err}")))
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|err| AppError::internal(format!("invalid password hash: {err}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn utc_now() -> DateTime<Utc> {
    Utc::now()
}

/// Shape check only: one `@`, non-empty local part, dotted domain, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|part| !part.is_empty())
}

pub fn device_type(headers: &HeaderMap) -> &'static str {
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if user_agent.contains("Mobile") {
        "mobile"
    } else {
        "desktop"
    }
}

/// Trims and rejects empty required text fields.
pub fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::bad_request(format!("{field} is required")));
    }
    Ok(value)
}

pub fn optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn short_passwords_are_rejected() {
        assert!(matches!(hash_password("short"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn hashes_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("minji@example.com"));
        assert!(!is_valid_email("minji@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("min ji@example.com"));
        assert!(!is_valid_email("a@b@example.com"));
        assert!(!is_valid_email("minji@.com"));
    }

    #[test]
    fn mobile_user_agents() {
        let mut headers = HeaderMap::new();
        assert_eq!(device_type(&headers), "desktop");
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 (iPhone) AppleWebKit/605.1.15 Mobile/15E148"),
        );
        assert_eq!(device_type(&headers), "mobile");
    }

    #[test]
    fn required_fields_are_trimmed() {
        assert_eq!(required("bride_name", "  Minji ").unwrap(), "Minji");
        assert!(required("bride_name", "   ").is_err());
        assert_eq!(optional(Some("  ")), None);
        assert_eq!(optional(Some(" Hall ")), Some("Hall"));
    }
}

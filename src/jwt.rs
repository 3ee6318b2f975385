use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::authz::{Role, TokenVerifier};
use crate::errors::AppError;

const DEFAULT_EXP_HOURS: i64 = 24 * 7;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: Arc<Vec<u8>>,
    pub exp_hours: i64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<Vec<u8>>, exp_hours: i64) -> Self {
        Self {
            secret: Arc::new(secret.into()),
            exp_hours,
        }
    }

    /// Requires `JWT_SECRET`; there is no built-in fallback secret.
    pub fn from_env() -> Result<Self, AppError> {
        let secret = std::env::var("JWT_SECRET").map_err(|_| AppError::configuration("JWT_SECRET not set"))?;
        if secret.trim().is_empty() {
            return Err(AppError::configuration("JWT_SECRET must not be empty"));
        }

        let exp_hours = std::env::var("JWT_EXP_HOURS")
            .map(|val| val.parse::<i64>())
            .unwrap_or(Ok(DEFAULT_EXP_HOURS))
            .map_err(|_| AppError::configuration("JWT_EXP_HOURS must be a valid integer"))?;

        Ok(Self::new(secret.into_bytes(), exp_hours))
    }

    pub fn encode(&self, subject: &TokenSubject<'_>) -> Result<String, AppError> {
        self.encode_at(subject, Utc::now())
    }

    pub fn encode_at(&self, subject: &TokenSubject<'_>, issued_at: DateTime<Utc>) -> Result<String, AppError> {
        let exp = issued_at + Duration::hours(self.exp_hours);

        let claims = Claims {
            sub: subject.user_id,
            email: subject.email.to_string(),
            name: subject.name.to_string(),
            role: subject.role.as_str().to_string(),
            exp: exp.timestamp(),
            iat: issued_at.timestamp(),
        };

        jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|err| AppError::internal(format!("failed to sign token: {err}")))
    }

    /// Checks the signature only. Expiry is judged by the identity resolver against its own clock.
    pub fn decode(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map(|data| data.claims)
    }
}

impl TokenVerifier for JwtConfig {
    fn verify(&self, token: &str) -> Result<Claims, String> {
        self.decode(token).map_err(|err| err.to_string())
    }
}

/// Identity fields embedded into a freshly issued token.
#[derive(Debug, Clone, Copy)]
pub struct TokenSubject<'a> {
    pub user_id: Uuid,
    pub email: &'a str,
    pub name: &'a str,
    pub role: Role,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    /// Kept as text so an unknown role is rejected by the resolver, not by serde.
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(role: Role) -> TokenSubject<'static> {
        TokenSubject {
            user_id: Uuid::nil(),
            email: "kim@example.com",
            name: "Kim",
            role,
        }
    }

    #[test]
    fn tokens_round_trip_claims() {
        let jwt = JwtConfig::new("test-secret", 1);
        let token = jwt.encode(&subject(Role::SuperAdmin)).unwrap();
        let claims = jwt.decode(&token).unwrap();

        assert_eq!(claims.sub, Uuid::nil());
        assert_eq!(claims.role, "superadmin");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let token = JwtConfig::new("one", 1).encode(&subject(Role::Owner)).unwrap();
        assert!(JwtConfig::new("two", 1).decode(&token).is_err());
    }
}

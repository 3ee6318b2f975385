use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::principal::{Principal, Role};
use crate::app::AppState;
use crate::errors::AppError;
use crate::jwt::Claims;
use crate::utils::utc_now;

const AUTH_COOKIE: &str = "auth_token";

/// Signature check over an inbound bearer token.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Claims, String>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("no credential presented")]
    Unauthenticated,
    #[error("invalid credential: {0}")]
    InvalidCredential(String),
}

/// A verified caller: the resolved principal plus the account it was issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub principal: Principal,
    pub subject_id: Uuid,
}

/// Turns an optional bearer token into a principal. Pure given the verifier and clock.
pub fn resolve_principal(
    token: Option<&str>,
    verifier: &dyn TokenVerifier,
    now: DateTime<Utc>,
) -> Result<Principal, IdentityError> {
    resolve_session(token, verifier, now).map(|session| session.principal)
}

pub fn resolve_session(
    token: Option<&str>,
    verifier: &dyn TokenVerifier,
    now: DateTime<Utc>,
) -> Result<Session, IdentityError> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(IdentityError::Unauthenticated)?;

    let claims = verifier.verify(token).map_err(IdentityError::InvalidCredential)?;

    if now.timestamp() >= claims.exp {
        return Err(IdentityError::InvalidCredential("token expired".to_string()));
    }

    let role: Role = claims
        .role
        .parse()
        .map_err(|err: super::principal::UnknownRole| IdentityError::InvalidCredential(err.to_string()))?;

    Ok(Session {
        principal: Principal::from_role(claims.sub, role),
        subject_id: claims.sub,
    })
}

/// Bearer header first, then the `auth_token` cookie used by browser sessions.
pub fn credential_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(bearer) = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        return Some(bearer.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == AUTH_COOKIE)
        .map(|(_, value)| value.to_string())
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = credential_from_headers(&parts.headers);
        let session = resolve_session(token.as_deref(), state.jwt.as_ref(), utc_now())?;

        tracing::debug!(principal = %session.principal, "resolved principal");
        Ok(session)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Session::from_request_parts(parts, state).await.map(|session| session.principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::{JwtConfig, TokenSubject};
    use axum::http::HeaderValue;
    use chrono::Duration;

    fn issue(jwt: &JwtConfig, user_id: Uuid, role: Role, at: DateTime<Utc>) -> String {
        let subject = TokenSubject {
            user_id,
            email: "lee@example.com",
            name: "Lee",
            role,
        };
        jwt.encode_at(&subject, at).unwrap()
    }

    #[test]
    fn missing_token_is_unauthenticated() {
        let jwt = JwtConfig::new("secret", 1);
        assert_eq!(resolve_principal(None, &jwt, Utc::now()), Err(IdentityError::Unauthenticated));
        assert_eq!(resolve_principal(Some("  "), &jwt, Utc::now()), Err(IdentityError::Unauthenticated));
    }

    #[test]
    fn admin_role_resolves_to_owner_of_the_subject() {
        let jwt = JwtConfig::new("secret", 1);
        let id = Uuid::new_v4();
        let now = Utc::now();
        let token = issue(&jwt, id, Role::Owner, now);

        assert_eq!(
            resolve_principal(Some(&token), &jwt, now),
            Ok(Principal::Owner { tenant_id: id })
        );
    }

    #[test]
    fn superadmin_role_resolves_to_super_admin() {
        let jwt = JwtConfig::new("secret", 1);
        let now = Utc::now();
        let id = Uuid::new_v4();
        let token = issue(&jwt, id, Role::SuperAdmin, now);

        assert_eq!(resolve_principal(Some(&token), &jwt, now), Ok(Principal::SuperAdmin));
        assert_eq!(resolve_session(Some(&token), &jwt, now).map(|s| s.subject_id), Ok(id));
    }

    #[test]
    fn expired_and_tampered_tokens_are_invalid() {
        let jwt = JwtConfig::new("secret", 1);
        let issued = Utc::now() - Duration::hours(2);
        let token = issue(&jwt, Uuid::new_v4(), Role::Owner, issued);

        assert!(matches!(
            resolve_principal(Some(&token), &jwt, Utc::now()),
            Err(IdentityError::InvalidCredential(_))
        ));
        assert!(matches!(
            resolve_principal(Some("not-a-jwt"), &jwt, Utc::now()),
            Err(IdentityError::InvalidCredential(_))
        ));
    }

    #[test]
    fn unknown_roles_fail_hard() {
        let jwt = JwtConfig::new("secret", 1);
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "x@example.com".into(),
            name: "X".into(),
            role: "viewer".into(),
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert_eq!(
            resolve_principal(Some(&token), &jwt, now),
            Err(IdentityError::InvalidCredential("unknown role: viewer".into()))
        );
    }

    #[test]
    fn credential_is_read_from_bearer_or_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; auth_token=abc"));
        assert_eq!(credential_from_headers(&headers).as_deref(), Some("abc"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(credential_from_headers(&headers).as_deref(), Some("xyz"));

        assert_eq!(credential_from_headers(&HeaderMap::new()), None);
    }
}

mod common;

use anyhow::Result;
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;
use wedding_memory::authz::Role;
use wedding_memory::jwt::{JwtConfig, TokenSubject};

#[tokio::test]
async fn register_login_and_me() -> Result<()> {
    let app = common::spawn().await?;

    let (token, user_id) = app.register_owner("Minji@Example.com").await?;

    let me = app.get("/api/auth/me", Some(&token)).await?;
    assert_eq!(me.status, StatusCode::OK);
    let v = me.json();
    assert_eq!(v["id"], user_id.as_str());
    assert_eq!(v["email"], "minji@example.com");
    assert_eq!(v["role"], "admin");
    assert!(v.get("password_hash").is_none());

    let login = app
        .json(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "minji@example.com", "password": "password123" }),
        )
        .await?;
    assert_eq!(login.status, StatusCode::OK);
    assert!(login.json()["token"].as_str().is_some());
    Ok(())
}

#[tokio::test]
async fn duplicate_email_conflicts() -> Result<()> {
    let app = common::spawn().await?;
    app.register_owner("dup@example.com").await?;

    let again = app
        .json(
            "POST",
            "/api/auth/register",
            None,
            json!({ "name": "Other", "email": "DUP@example.com", "password": "password123" }),
        )
        .await?;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.error_kind(), "conflict");
    Ok(())
}

#[tokio::test]
async fn register_rejects_bad_input() -> Result<()> {
    let app = common::spawn().await?;

    let bad_email = app
        .json(
            "POST",
            "/api/auth/register",
            None,
            json!({ "name": "Kim", "email": "not-an-email", "password": "password123" }),
        )
        .await?;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);

    let short_password = app
        .json(
            "POST",
            "/api/auth/register",
            None,
            json!({ "name": "Kim", "email": "kim@example.com", "password": "short" }),
        )
        .await?;
    assert_eq!(short_password.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() -> Result<()> {
    let app = common::spawn().await?;
    app.register_owner("kim@example.com").await?;

    let wrong = app
        .json("POST", "/api/auth/login", None, json!({ "email": "kim@example.com", "password": "nope-nope" }))
        .await?;
    let unknown = app
        .json("POST", "/api/auth/login", None, json!({ "email": "who@example.com", "password": "nope-nope" }))
        .await?;

    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.json(), unknown.json());
    Ok(())
}

#[tokio::test]
async fn missing_and_bad_credentials_are_told_apart() -> Result<()> {
    let app = common::spawn().await?;

    let none = app.get("/api/auth/me", None).await?;
    assert_eq!(none.status, StatusCode::UNAUTHORIZED);
    assert_eq!(none.error_kind(), "unauthenticated");

    let garbage = app.get("/api/auth/me", Some("not.a.jwt")).await?;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
    assert_eq!(garbage.error_kind(), "invalid_credential");

    let forged = JwtConfig::new("some-other-secret", 24).encode(&TokenSubject {
        user_id: Uuid::new_v4(),
        email: "x@example.com",
        name: "X",
        role: Role::Owner,
    })?;
    let forged = app.get("/api/auth/me", Some(&forged)).await?;
    assert_eq!(forged.error_kind(), "invalid_credential");
    Ok(())
}

#[tokio::test]
async fn expired_token_is_an_invalid_credential() -> Result<()> {
    let app = common::spawn().await?;
    let (_, user_id) = app.register_owner("old@example.com").await?;

    let stale = JwtConfig::new("test-secret", 24).encode_at(
        &TokenSubject {
            user_id: user_id.parse()?,
            email: "old@example.com",
            name: "Owner",
            role: Role::Owner,
        },
        Utc::now() - Duration::hours(25),
    )?;

    let reply = app.get("/api/weddings/my", Some(&stale)).await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.error_kind(), "invalid_credential");
    Ok(())
}

#[tokio::test]
async fn password_change_requires_current_password() -> Result<()> {
    let app = common::spawn().await?;
    let (token, _) = app.register_owner("pw@example.com").await?;

    let wrong = app
        .json(
            "PUT",
            "/api/auth/password",
            Some(&token),
            json!({ "current_password": "not-it-at-all", "new_password": "brandnew123" }),
        )
        .await?;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let ok = app
        .json(
            "PUT",
            "/api/auth/password",
            Some(&token),
            json!({ "current_password": "password123", "new_password": "brandnew123" }),
        )
        .await?;
    assert_eq!(ok.status, StatusCode::OK);

    let old = app
        .json("POST", "/api/auth/login", None, json!({ "email": "pw@example.com", "password": "password123" }))
        .await?;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);

    let new = app
        .json("POST", "/api/auth/login", None, json!({ "email": "pw@example.com", "password": "brandnew123" }))
        .await?;
    assert_eq!(new.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn super_admin_can_read_own_profile() -> Result<()> {
    let app = common::spawn().await?;
    let token = app.super_admin_token().await?;

    let me = app.get("/api/auth/me", Some(&token)).await?;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.json()["role"], "superadmin");
    Ok(())
}

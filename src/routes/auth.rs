use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::authz::{Principal, Role, Session};
use crate::db;
use crate::db::users::NewUser;
use crate::errors::{AppError, AppResult};
use crate::jwt::TokenSubject;
use crate::models::admin::MessageResponse;
use crate::models::user::{AuthResponse, DbUser, LoginRequest, PasswordChangeRequest, RegisterRequest, User};
use crate::utils::{hash_password, is_valid_email, required, utc_now, verify_password};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Owner account registered", body = AuthResponse),
        (status = 400, description = "Invalid email or password"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let name = required("name", &payload.name)?;
    let email = payload.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::bad_request("invalid email address"));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = NewUser {
        email: &email,
        name,
        password_hash: &password_hash,
        role: Role::Owner,
    };
    let db_user = db::users::insert(&state.pool, user, utc_now()).await?;

    tracing::info!(user_id = %db_user.id, "owner registered");
    let response = issue(&state, db_user)?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = payload.email.trim().to_lowercase();
    let db_user = db::users::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::unauthenticated("invalid credentials"))?;

    if !verify_password(&payload.password, &db_user.password_hash)? {
        return Err(AppError::unauthenticated("invalid credentials"));
    }

    Ok(Json(issue(&state, db_user)?))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current account", body = User),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn me(State(state): State<AppState>, session: Session) -> AppResult<Json<User>> {
    let db_user = current_user(&state, &session).await?;
    Ok(Json(db_user.into()))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Logout acknowledged", body = MessageResponse)),
    security(("bearerAuth" = []))
)]
pub async fn logout(_principal: Principal) -> AppResult<Json<MessageResponse>> {
    Ok(Json(MessageResponse::new("Logged out")))
}

#[utoipa::path(
    put,
    path = "/api/auth/password",
    tag = "Auth",
    request_body = PasswordChangeRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "New password too short"),
        (status = 401, description = "Current password does not match")
    ),
    security(("bearerAuth" = []))
)]
pub async fn change_password(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<PasswordChangeRequest>,
) -> AppResult<Json<MessageResponse>> {
    let db_user = current_user(&state, &session).await?;

    if !verify_password(&payload.current_password, &db_user.password_hash)? {
        return Err(AppError::unauthenticated("current password does not match"));
    }

    let password_hash = hash_password(&payload.new_password)?;
    db::users::update_password(&state.pool, db_user.id, &password_hash, utc_now()).await?;

    tracing::info!(user_id = %db_user.id, "password changed");
    Ok(Json(MessageResponse::new("Password changed")))
}

async fn current_user(state: &AppState, session: &Session) -> AppResult<DbUser> {
    db::users::find_by_id(&state.pool, session.subject_id)
        .await?
        .ok_or_else(|| AppError::unauthenticated("account no longer exists"))
}

fn issue(state: &AppState, db_user: DbUser) -> AppResult<AuthResponse> {
    let token = state.jwt.encode(&TokenSubject {
        user_id: db_user.id,
        email: &db_user.email,
        name: &db_user.name,
        role: db_user.role,
    })?;

    Ok(AuthResponse {
        token,
        user: db_user.into(),
    })
}

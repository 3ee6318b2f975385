use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::row_parsers::{db_user_from_row, parse_datetime};
use super::{contains_pattern, is_unique_violation, timestamp};
use crate::authz::Role;
use crate::errors::{AppError, AppResult};
use crate::models::admin::AdminUserRow;
use crate::models::user::DbUser;

const USER_COLUMNS: &str = "id, email, name, password_hash, role, created_at, updated_at";

pub struct NewUser<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
}

pub async fn insert(pool: &SqlitePool, user: NewUser<'_>, now: DateTime<Utc>) -> AppResult<DbUser> {
    let id = Uuid::new_v4();
    let result = sqlx::query(
        "INSERT INTO users (id, email, name, password_hash, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(user.email)
    .bind(user.name)
    .bind(user.password_hash)
    .bind(user.role.as_str())
    .bind(timestamp(now))
    .bind(timestamp(now))
    .execute(pool)
    .await;

    match result {
        Ok(_) => {}
        Err(err) if is_unique_violation(&err) => return Err(AppError::conflict("email already in use")),
        Err(err) => return Err(err.into()),
    }

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::internal("user vanished after insert"))
}

pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> AppResult<Option<DbUser>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    let row = sqlx::query(&sql).bind(id.to_string()).fetch_optional(pool).await?;
    row.as_ref().map(db_user_from_row).transpose()
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<DbUser>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
    let row = sqlx::query(&sql).bind(email).fetch_optional(pool).await?;
    row.as_ref().map(db_user_from_row).transpose()
}

pub async fn update_password(pool: &SqlitePool, id: Uuid, password_hash: &str, now: DateTime<Utc>) -> AppResult<()> {
    sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(password_hash)
        .bind(timestamp(now))
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Creates the super admin account, or resets name, role and password when the email exists.
pub async fn upsert_super_admin(
    pool: &SqlitePool,
    email: &str,
    name: &str,
    password_hash: &str,
    now: DateTime<Utc>,
) -> AppResult<DbUser> {
    sqlx::query(
        "INSERT INTO users (id, email, name, password_hash, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(email) DO UPDATE SET name = excluded.name, password_hash = excluded.password_hash, role = excluded.role, updated_at = excluded.updated_at",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .bind(Role::SuperAdmin.as_str())
    .bind(timestamp(now))
    .bind(timestamp(now))
    .execute(pool)
    .await?;

    find_by_email(pool, email)
        .await?
        .ok_or_else(|| AppError::internal("super admin vanished after upsert"))
}

pub async fn count_owners(pool: &SqlitePool) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE role = ?")
        .bind(Role::Owner.as_str())
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Owner accounts, newest first, optionally filtered by a literal substring of name or email.
pub async fn list_owners(
    pool: &SqlitePool,
    search: Option<&str>,
    limit: u32,
    offset: i64,
) -> AppResult<(Vec<AdminUserRow>, i64)> {
    let pattern = search.map(contains_pattern);
    let filter = "u.role = ? AND (? IS NULL OR u.name LIKE ? ESCAPE '\\' OR u.email LIKE ? ESCAPE '\\')";

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(1) FROM users u WHERE {filter}"))
        .bind(Role::Owner.as_str())
        .bind(pattern.as_deref())
        .bind(pattern.as_deref())
        .bind(pattern.as_deref())
        .fetch_one(pool)
        .await?;

    let sql = format!(
        "SELECT u.id, u.email, u.name, u.role, u.created_at, \
                (SELECT COUNT(1) FROM weddings w WHERE w.user_id = u.id) AS wedding_count \
         FROM users u WHERE {filter} ORDER BY u.created_at DESC LIMIT ? OFFSET ?"
    );
    let rows = sqlx::query(&sql)
        .bind(Role::Owner.as_str())
        .bind(pattern.as_deref())
        .bind(pattern.as_deref())
        .bind(pattern.as_deref())
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let users = rows
        .iter()
        .map(|row| {
            use sqlx::Row;
            let id: String = row.try_get("id")?;
            let role: String = row.try_get("role")?;
            let created_at: String = row.try_get("created_at")?;
            Ok::<_, AppError>(AdminUserRow {
                id: Uuid::parse_str(&id).map_err(|e| AppError::internal(format!("invalid uuid: {}", e)))?,
                email: row.try_get("email")?,
                name: row.try_get("name")?,
                role: role.parse().map_err(|e: crate::authz::UnknownRole| AppError::internal(e.to_string()))?,
                created_at: parse_datetime(&created_at)?,
                wedding_count: row.try_get("wedding_count")?,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok((users, total))
}

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::row_parsers::db_wedding_from_row;
use super::{contains_pattern, date, is_unique_violation, timestamp};
use crate::authz::PlanId;
use crate::errors::{AppError, AppResult};
use crate::models::admin::PlanCount;
use crate::models::wedding::DbWedding;

const WEDDING_COLUMNS: &str = "id, user_id, bride_name, groom_name, wedding_date, wedding_time, venue_name, contact_email, \
     plan_id, expires_at, is_active, upload_disabled, cover_image_key, cover_image_url, cover_content_type, created_at, updated_at";

/// Owner-editable fields. Plan and expiry travel together.
#[derive(Debug, Clone)]
pub struct WeddingDetails<'a> {
    pub bride_name: &'a str,
    pub groom_name: &'a str,
    pub wedding_date: chrono::NaiveDate,
    pub wedding_time: Option<&'a str>,
    pub venue_name: Option<&'a str>,
    pub contact_email: &'a str,
    pub plan_id: PlanId,
    pub expires_at: Option<DateTime<Utc>>,
}

pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> AppResult<Option<DbWedding>> {
    let sql = format!("SELECT {WEDDING_COLUMNS} FROM weddings WHERE id = ?");
    let row = sqlx::query(&sql).bind(id.to_string()).fetch_optional(pool).await?;
    row.as_ref().map(db_wedding_from_row).transpose()
}

pub async fn find_by_user(pool: &SqlitePool, user_id: Uuid) -> AppResult<Option<DbWedding>> {
    let sql = format!("SELECT {WEDDING_COLUMNS} FROM weddings WHERE user_id = ?");
    let row = sqlx::query(&sql).bind(user_id.to_string()).fetch_optional(pool).await?;
    row.as_ref().map(db_wedding_from_row).transpose()
}

/// Inserts the tenant's event. A second event for the same tenant is a conflict.
pub async fn insert(pool: &SqlitePool, user_id: Uuid, details: &WeddingDetails<'_>, now: DateTime<Utc>) -> AppResult<DbWedding> {
    let id = Uuid::new_v4();
    let result = sqlx::query(
        "INSERT INTO weddings (id, user_id, bride_name, groom_name, wedding_date, wedding_time, venue_name, contact_email, \
         plan_id, expires_at, is_active, upload_disabled, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, 0, ?, ?)",
    )
    .bind(id.to_string())
    .bind(user_id.to_string())
    .bind(details.bride_name)
    .bind(details.groom_name)
    .bind(date(details.wedding_date))
    .bind(details.wedding_time)
    .bind(details.venue_name)
    .bind(details.contact_email)
    .bind(details.plan_id.as_str())
    .bind(details.expires_at.map(timestamp))
    .bind(timestamp(now))
    .bind(timestamp(now))
    .execute(pool)
    .await;

    match result {
        Ok(_) => {}
        Err(err) if is_unique_violation(&err) => {
            return Err(AppError::conflict("an event already exists for this account"))
        }
        Err(err) => return Err(err.into()),
    }

    fetch(pool, id).await
}

pub async fn update_details(pool: &SqlitePool, id: Uuid, details: &WeddingDetails<'_>, now: DateTime<Utc>) -> AppResult<DbWedding> {
    sqlx::query(
        "UPDATE weddings SET bride_name = ?, groom_name = ?, wedding_date = ?, wedding_time = ?, venue_name = ?, \
         contact_email = ?, plan_id = ?, expires_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(details.bride_name)
    .bind(details.groom_name)
    .bind(date(details.wedding_date))
    .bind(details.wedding_time)
    .bind(details.venue_name)
    .bind(details.contact_email)
    .bind(details.plan_id.as_str())
    .bind(details.expires_at.map(timestamp))
    .bind(timestamp(now))
    .bind(id.to_string())
    .execute(pool)
    .await?;

    fetch(pool, id).await
}

pub async fn set_plan(
    pool: &SqlitePool,
    id: Uuid,
    plan_id: PlanId,
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> AppResult<DbWedding> {
    sqlx::query("UPDATE weddings SET plan_id = ?, expires_at = ?, updated_at = ? WHERE id = ?")
        .bind(plan_id.as_str())
        .bind(expires_at.map(timestamp))
        .bind(timestamp(now))
        .bind(id.to_string())
        .execute(pool)
        .await?;

    fetch(pool, id).await
}

pub async fn set_upload_disabled(pool: &SqlitePool, id: Uuid, disabled: bool, now: DateTime<Utc>) -> AppResult<()> {
    sqlx::query("UPDATE weddings SET upload_disabled = ?, updated_at = ? WHERE id = ?")
        .bind(disabled)
        .bind(timestamp(now))
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Returns false when no such event exists.
pub async fn set_active(pool: &SqlitePool, id: Uuid, active: bool, now: DateTime<Utc>) -> AppResult<bool> {
    let result = sqlx::query("UPDATE weddings SET is_active = ?, updated_at = ? WHERE id = ?")
        .bind(active)
        .bind(timestamp(now))
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_cover(
    pool: &SqlitePool,
    id: Uuid,
    key: &str,
    url: &str,
    content_type: &str,
    now: DateTime<Utc>,
) -> AppResult<()> {
    sqlx::query(
        "UPDATE weddings SET cover_image_key = ?, cover_image_url = ?, cover_content_type = ?, updated_at = ? WHERE id = ?",
    )
    .bind(key)
    .bind(url)
    .bind(content_type)
    .bind(timestamp(now))
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

async fn fetch(pool: &SqlitePool, id: Uuid) -> AppResult<DbWedding> {
    find_by_id(pool, id).await?.ok_or_else(|| AppError::not_found("wedding not found"))
}

pub async fn count(pool: &SqlitePool) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM weddings").fetch_one(pool).await?;
    Ok(count)
}

pub async fn plan_distribution(pool: &SqlitePool) -> AppResult<Vec<PlanCount>> {
    let rows = sqlx::query("SELECT plan_id, COUNT(1) AS count FROM weddings GROUP BY plan_id ORDER BY plan_id")
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| {
            Ok::<_, AppError>(PlanCount {
                plan_id: row.try_get("plan_id")?,
                count: row.try_get("count")?,
            })
        })
        .collect()
}

/// One row of the platform-wide event listing.
pub struct AdminWeddingRecord {
    pub wedding: DbWedding,
    pub owner_email: Option<String>,
    pub owner_name: Option<String>,
    pub upload_count: i64,
    pub total_size: i64,
}

/// Every event, newest first. `search` matches couple names, venue or owner email as a literal substring.
pub async fn list_all(
    pool: &SqlitePool,
    search: Option<&str>,
    limit: u32,
    offset: i64,
) -> AppResult<(Vec<AdminWeddingRecord>, i64)> {
    let pattern = search.map(contains_pattern);
    let filter = "(? IS NULL OR w.bride_name LIKE ? ESCAPE '\\' OR w.groom_name LIKE ? ESCAPE '\\' \
                  OR w.venue_name LIKE ? ESCAPE '\\' OR u.email LIKE ? ESCAPE '\\')";

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(1) FROM weddings w LEFT JOIN users u ON u.id = w.user_id WHERE {filter}"
    ))
    .bind(pattern.as_deref())
    .bind(pattern.as_deref())
    .bind(pattern.as_deref())
    .bind(pattern.as_deref())
    .bind(pattern.as_deref())
    .fetch_one(pool)
    .await?;

    let columns = WEDDING_COLUMNS
        .split(',')
        .map(|c| format!("w.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT {columns}, u.email AS owner_email, u.name AS owner_name, \
                (SELECT COUNT(1) FROM uploads x WHERE x.wedding_id = w.id) AS upload_count, \
                (SELECT COALESCE(SUM(x.file_size), 0) FROM uploads x WHERE x.wedding_id = w.id) AS total_size \
         FROM weddings w LEFT JOIN users u ON u.id = w.user_id \
         WHERE {filter} ORDER BY w.created_at DESC LIMIT ? OFFSET ?"
    );
    let rows = sqlx::query(&sql)
        .bind(pattern.as_deref())
        .bind(pattern.as_deref())
        .bind(pattern.as_deref())
        .bind(pattern.as_deref())
        .bind(pattern.as_deref())
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let records = rows
        .iter()
        .map(|row| {
            Ok::<_, AppError>(AdminWeddingRecord {
                wedding: db_wedding_from_row(row)?,
                owner_email: row.try_get("owner_email")?,
                owner_name: row.try_get("owner_name")?,
                upload_count: row.try_get("upload_count")?,
                total_size: row.try_get("total_size")?,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok((records, total))
}

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Decode, Row, Sqlite, Type};
use uuid::Uuid;

use crate::authz::{MediaKind, PlanId, Role};
use crate::errors::AppError;
use crate::models::{upload::DbUpload, user::DbUser, wedding::DbWedding};

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, AppError> {
    let s = s.trim();

    // RFC3339 (what the query modules write)
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // SQLite CURRENT_TIMESTAMP format, with optional fractional seconds
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    Err(AppError::internal(format!("invalid datetime: {}", s)))
}

fn parse_opt_datetime(s: Option<String>) -> Result<Option<DateTime<Utc>>, AppError> {
    match s {
        Some(s) if !s.trim().is_empty() => Ok(Some(parse_datetime(&s)?)),
        _ => Ok(None),
    }
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| AppError::internal(format!("invalid date {}: {}", s, e)))
}

fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(s).map_err(|e| AppError::internal(format!("invalid uuid: {}", e)))
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, AppError>
where
    T: Decode<'r, Sqlite> + Type<Sqlite>,
{
    row.try_get(name).map_err(|e| AppError::internal(format!("missing {}: {}", name, e)))
}

pub fn db_user_from_row(row: &SqliteRow) -> Result<DbUser, AppError> {
    let id_s: String = column(row, "id")?;
    let email: String = column(row, "email")?;
    let name: String = column(row, "name")?;
    let password_hash: String = column(row, "password_hash")?;
    let role_s: String = column(row, "role")?;
    let created_at_s: String = column(row, "created_at")?;
    let updated_at_s: String = column(row, "updated_at")?;

    let id = parse_uuid(&id_s)?;
    let role: Role = role_s.parse().map_err(|e: crate::authz::UnknownRole| AppError::internal(e.to_string()))?;
    let created_at = parse_datetime(&created_at_s)?;
    let updated_at = parse_datetime(&updated_at_s)?;

    Ok(DbUser { id, email, name, password_hash, role, created_at, updated_at })
}

pub fn db_wedding_from_row(row: &SqliteRow) -> Result<DbWedding, AppError> {
    let id_s: String = column(row, "id")?;
    let user_id_s: String = column(row, "user_id")?;
    let bride_name: String = column(row, "bride_name")?;
    let groom_name: String = column(row, "groom_name")?;
    let wedding_date_s: String = column(row, "wedding_date")?;
    let wedding_time: Option<String> = column(row, "wedding_time")?;
    let venue_name: Option<String> = column(row, "venue_name")?;
    let contact_email: String = column(row, "contact_email")?;
    let plan_id_s: String = column(row, "plan_id")?;
    let expires_at_s: Option<String> = column(row, "expires_at")?;
    let is_active: bool = column(row, "is_active")?;
    let upload_disabled: bool = column(row, "upload_disabled")?;
    let cover_image_key: Option<String> = column(row, "cover_image_key")?;
    let cover_image_url: Option<String> = column(row, "cover_image_url")?;
    let cover_content_type: Option<String> = column(row, "cover_content_type")?;
    let created_at_s: String = column(row, "created_at")?;
    let updated_at_s: String = column(row, "updated_at")?;

    let id = parse_uuid(&id_s)?;
    let user_id = parse_uuid(&user_id_s)?;
    let wedding_date = parse_date(&wedding_date_s)?;
    let plan_id: PlanId = plan_id_s.parse().map_err(|e: crate::authz::UnknownPlan| AppError::internal(e.to_string()))?;
    let expires_at = parse_opt_datetime(expires_at_s)?;
    let created_at = parse_datetime(&created_at_s)?;
    let updated_at = parse_datetime(&updated_at_s)?;

    Ok(DbWedding {
        id,
        user_id,
        bride_name,
        groom_name,
        wedding_date,
        wedding_time,
        venue_name,
        contact_email,
        plan_id,
        expires_at,
        is_active,
        upload_disabled,
        cover_image_key,
        cover_image_url,
        cover_content_type,
        created_at,
        updated_at,
    })
}

pub fn db_upload_from_row(row: &SqliteRow) -> Result<DbUpload, AppError> {
    let id_s: String = column(row, "id")?;
    let wedding_id_s: String = column(row, "wedding_id")?;
    let guest_name: String = column(row, "guest_name")?;
    let file_key: String = column(row, "file_key")?;
    let file_name: String = column(row, "file_name")?;
    let file_type_s: String = column(row, "file_type")?;
    let file_size: i64 = column(row, "file_size")?;
    let mime_type: String = column(row, "mime_type")?;
    let checksum: String = column(row, "checksum")?;
    let device_type: Option<String> = column(row, "device_type")?;
    let uploaded_at_s: String = column(row, "uploaded_at")?;

    let id = parse_uuid(&id_s)?;
    let wedding_id = parse_uuid(&wedding_id_s)?;
    let file_type = MediaKind::parse(&file_type_s)
        .ok_or_else(|| AppError::internal(format!("invalid file_type: {}", file_type_s)))?;
    let uploaded_at = parse_datetime(&uploaded_at_s)?;

    Ok(DbUpload {
        id,
        wedding_id,
        guest_name,
        file_key,
        file_name,
        file_type,
        file_size,
        mime_type,
        checksum,
        device_type,
        uploaded_at,
    })
}

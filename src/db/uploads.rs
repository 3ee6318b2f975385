use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::row_parsers::db_upload_from_row;
use super::timestamp;
use crate::errors::AppResult;
use crate::models::upload::{DbUpload, UploadStats};

const UPLOAD_COLUMNS: &str =
    "id, wedding_id, guest_name, file_key, file_name, file_type, file_size, mime_type, checksum, device_type, uploaded_at";

/// Writes the upload row and marks its guest in one transaction.
pub async fn record(pool: &SqlitePool, upload: &DbUpload) -> AppResult<()> {
    let mut tx = pool.begin().await?;
    insert(&mut *tx, upload).await?;
    mark_guest(
        &mut *tx,
        upload.wedding_id,
        &upload.guest_name,
        upload.device_type.as_deref(),
        upload.uploaded_at,
    )
    .await?;
    tx.commit().await?;
    Ok(())
}

async fn insert(conn: &mut SqliteConnection, upload: &DbUpload) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO uploads (id, wedding_id, guest_name, file_key, file_name, file_type, file_size, mime_type, checksum, device_type, uploaded_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(upload.id.to_string())
    .bind(upload.wedding_id.to_string())
    .bind(&upload.guest_name)
    .bind(&upload.file_key)
    .bind(&upload.file_name)
    .bind(upload.file_type.as_str())
    .bind(upload.file_size)
    .bind(&upload.mime_type)
    .bind(&upload.checksum)
    .bind(upload.device_type.as_deref())
    .bind(timestamp(upload.uploaded_at))
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Repeated marks for the same name are no-ops.
async fn mark_guest(
    conn: &mut SqliteConnection,
    wedding_id: Uuid,
    name: &str,
    device_type: Option<&str>,
    now: DateTime<Utc>,
) -> AppResult<()> {
    sqlx::query("INSERT OR IGNORE INTO guests (id, wedding_id, name, device_type, visited_at) VALUES (?, ?, ?, ?, ?)")
        .bind(Uuid::new_v4().to_string())
        .bind(wedding_id.to_string())
        .bind(name)
        .bind(device_type)
        .bind(timestamp(now))
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> AppResult<Option<DbUpload>> {
    let sql = format!("SELECT {UPLOAD_COLUMNS} FROM uploads WHERE id = ?");
    let row = sqlx::query(&sql).bind(id.to_string()).fetch_optional(pool).await?;
    row.as_ref().map(db_upload_from_row).transpose()
}

pub async fn delete(pool: &SqlitePool, id: Uuid) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM uploads WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Newest first.
pub async fn list_for_wedding(
    pool: &SqlitePool,
    wedding_id: Uuid,
    limit: u32,
    offset: i64,
) -> AppResult<(Vec<DbUpload>, i64)> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM uploads WHERE wedding_id = ?")
        .bind(wedding_id.to_string())
        .fetch_one(pool)
        .await?;

    let sql = format!(
        "SELECT {UPLOAD_COLUMNS} FROM uploads WHERE wedding_id = ? ORDER BY uploaded_at DESC, id LIMIT ? OFFSET ?"
    );
    let rows = sqlx::query(&sql)
        .bind(wedding_id.to_string())
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let uploads = rows.iter().map(db_upload_from_row).collect::<AppResult<Vec<_>>>()?;
    Ok((uploads, total))
}

pub async fn stats_for_wedding(pool: &SqlitePool, wedding_id: Uuid) -> AppResult<UploadStats> {
    let row = sqlx::query(
        "SELECT COUNT(1) AS total_count, \
                COALESCE(SUM(CASE WHEN file_type = 'photo' THEN 1 ELSE 0 END), 0) AS photo_count, \
                COALESCE(SUM(CASE WHEN file_type = 'video' THEN 1 ELSE 0 END), 0) AS video_count, \
                COALESCE(SUM(file_size), 0) AS total_size, \
                (SELECT COUNT(1) FROM guests g WHERE g.wedding_id = ?) AS guest_count \
         FROM uploads WHERE wedding_id = ?",
    )
    .bind(wedding_id.to_string())
    .bind(wedding_id.to_string())
    .fetch_one(pool)
    .await?;

    Ok(UploadStats {
        total_count: row.try_get("total_count")?,
        photo_count: row.try_get("photo_count")?,
        video_count: row.try_get("video_count")?,
        total_size: row.try_get("total_size")?,
        guest_count: row.try_get("guest_count")?,
    })
}

/// Platform totals: (uploads, stored bytes, distinct guests).
pub async fn platform_totals(pool: &SqlitePool) -> AppResult<(i64, i64, i64)> {
    let row = sqlx::query(
        "SELECT (SELECT COUNT(1) FROM uploads) AS uploads, \
                (SELECT COALESCE(SUM(file_size), 0) FROM uploads) AS bytes, \
                (SELECT COUNT(1) FROM guests) AS guests",
    )
    .fetch_one(pool)
    .await?;

    Ok((row.try_get("uploads")?, row.try_get("bytes")?, row.try_get("guests")?))
}

//! Upload admission for guest media and owner cover images.
//!
//! Screening is a pure, ordered rule list where the first failure wins:
//! event visible, uploads open, guest name, size, type. Only an admitted
//! file reaches the blob store, and the blob is written before its row, so a
//! record never points at a missing blob. The row and the guest mark commit
//! together; if that fails after the blob landed, the orphaned blob is logged.

use axum::body::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use utoipa::ToSchema;
use uuid::Uuid;

use super::lifecycle::{lifecycle_of, GuestAccess, Lifecycle};
use super::ownership::authorize_owner_action;
use super::principal::Principal;
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::models::upload::DbUpload;
use crate::models::wedding::DbWedding;
use crate::storage::{cover_key, media_key, BlobStore};

const MIB: u64 = 1024 * 1024;

pub const MAX_UPLOAD_BYTES: u64 = 500 * MIB;
pub const MAX_COVER_BYTES: u64 = 10 * MIB;
pub const MAX_GUEST_NAME_CHARS: usize = 20;

const COVER_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "photo" => Some(MediaKind::Photo),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }

    /// The accepted mime types, with the kind and file extension each one is stored under.
    pub fn from_mime(mime_type: &str) -> Option<(Self, &'static str)> {
        match mime_type {
            "image/jpeg" => Some((MediaKind::Photo, "jpg")),
            "image/png" => Some((MediaKind::Photo, "png")),
            "image/heic" => Some((MediaKind::Photo, "heic")),
            "image/heif" => Some((MediaKind::Photo, "heif")),
            "image/webp" => Some((MediaKind::Photo, "webp")),
            "video/mp4" => Some((MediaKind::Video, "mp4")),
            "video/quicktime" | "video/mov" => Some((MediaKind::Video, "mov")),
            _ => None,
        }
    }
}

/// Shape of a submitted file as observed by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
}

/// A submitted file. `bytes` may be truncated when `descriptor.size` is over a limit.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub descriptor: FileDescriptor,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("wedding not found")]
    NotFound,
    #[error("uploads are closed for this wedding")]
    UploadsClosed,
    #[error("guest name must be 1-20 letters, digits or spaces")]
    InvalidGuestName,
    #[error("file exceeds the {} MiB limit", limit / MIB)]
    FileTooLarge { limit: u64 },
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
}

impl Rejection {
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::NotFound => "not_found",
            Rejection::UploadsClosed => "uploads_closed",
            Rejection::InvalidGuestName => "invalid_guest_name",
            Rejection::FileTooLarge { .. } => "file_too_large",
            Rejection::UnsupportedType(_) => "unsupported_type",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Admission<T> {
    Accepted(T),
    Rejected(Rejection),
}

impl<T> Admission<T> {
    pub fn into_result(self) -> AppResult<T> {
        match self {
            Admission::Accepted(value) => Ok(value),
            Admission::Rejected(reason) => Err(reason.into()),
        }
    }
}

/// Result of screening: what will be recorded for an admitted guest file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screened {
    pub guest_name: String,
    pub kind: MediaKind,
    pub extension: &'static str,
}

/// Trimmed name of 1 to 20 characters: letters of any script, digits and whitespace.
pub fn validate_guest_name(raw: &str) -> Result<String, Rejection> {
    let name = raw.trim();
    let valid = !name.is_empty()
        && name.chars().count() <= MAX_GUEST_NAME_CHARS
        && name.chars().all(|c| c.is_alphanumeric() || c.is_whitespace());

    if valid {
        Ok(name.to_string())
    } else {
        Err(Rejection::InvalidGuestName)
    }
}

pub fn screen_guest_upload(
    lifecycle: Option<&Lifecycle>,
    guest_name: &str,
    file: &FileDescriptor,
) -> Result<Screened, Rejection> {
    match lifecycle.map(Lifecycle::guest_access) {
        None | Some(GuestAccess::NotFound) => return Err(Rejection::NotFound),
        Some(GuestAccess::ReadOnly) => return Err(Rejection::UploadsClosed),
        Some(GuestAccess::Open) => {}
    }

    let guest_name = validate_guest_name(guest_name)?;

    if file.size > MAX_UPLOAD_BYTES {
        return Err(Rejection::FileTooLarge { limit: MAX_UPLOAD_BYTES });
    }

    let (kind, extension) =
        MediaKind::from_mime(&file.mime_type).ok_or_else(|| Rejection::UnsupportedType(file.mime_type.clone()))?;

    Ok(Screened {
        guest_name,
        kind,
        extension,
    })
}

pub fn screen_cover_upload(file: &FileDescriptor) -> Result<(), Rejection> {
    if file.size > MAX_COVER_BYTES {
        return Err(Rejection::FileTooLarge { limit: MAX_COVER_BYTES });
    }
    if !COVER_MIME_TYPES.contains(&file.mime_type.as_str()) {
        return Err(Rejection::UnsupportedType(file.mime_type.clone()));
    }
    Ok(())
}

pub fn checksum_of(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Who submitted a guest file and where to.
#[derive(Debug, Clone, Copy)]
pub struct GuestSubmission<'a> {
    pub wedding_id: Uuid,
    pub guest_name: &'a str,
    pub device_type: Option<&'a str>,
}

pub async fn admit_upload(
    pool: &SqlitePool,
    blobs: &dyn BlobStore,
    submission: GuestSubmission<'_>,
    file: IncomingFile,
    now: DateTime<Utc>,
) -> AppResult<Admission<DbUpload>> {
    let wedding = db::weddings::find_by_id(pool, submission.wedding_id).await?;
    let lifecycle = wedding.as_ref().map(|w| lifecycle_of(&w.flags(), now));

    let screened = match screen_guest_upload(lifecycle.as_ref(), submission.guest_name, &file.descriptor) {
        Ok(screened) => screened,
        Err(reason) => {
            tracing::debug!(wedding_id = %submission.wedding_id, reason = %reason, "guest upload rejected");
            return Ok(Admission::Rejected(reason));
        }
    };

    let upload_id = Uuid::new_v4();
    let file_key = media_key(submission.wedding_id, upload_id, screened.extension);
    let checksum = checksum_of(&file.bytes);
    let file_size = i64::try_from(file.bytes.len()).map_err(|_| AppError::internal("file size overflow"))?;

    blobs.put(&file_key, file.bytes, &file.descriptor.mime_type).await?;

    let upload = DbUpload {
        id: upload_id,
        wedding_id: submission.wedding_id,
        guest_name: screened.guest_name,
        file_key,
        file_name: file.descriptor.file_name,
        file_type: screened.kind,
        file_size,
        mime_type: file.descriptor.mime_type,
        checksum,
        device_type: submission.device_type.map(str::to_string),
        uploaded_at: now,
    };

    if let Err(err) = db::uploads::record(pool, &upload).await {
        tracing::warn!(file_key = %upload.file_key, "upload not recorded; blob left orphaned");
        return Err(err);
    }

    tracing::info!(
        wedding_id = %upload.wedding_id,
        upload_id = %upload.id,
        file_type = upload.file_type.as_str(),
        size = upload.file_size,
        "guest upload accepted"
    );
    Ok(Admission::Accepted(upload))
}

/// Public URL the cover of `wedding_id` is served from.
pub fn cover_url(wedding_id: Uuid) -> String {
    format!("/api/uploads/cover-image/{wedding_id}")
}

/// Owner cover image: ownership first, then size and type. Overwrites the previous cover.
pub async fn admit_cover_upload(
    pool: &SqlitePool,
    blobs: &dyn BlobStore,
    principal: &Principal,
    wedding: &DbWedding,
    file: IncomingFile,
    now: DateTime<Utc>,
) -> AppResult<Admission<String>> {
    authorize_owner_action(principal, wedding).into_result()?;

    if let Err(reason) = screen_cover_upload(&file.descriptor) {
        tracing::debug!(wedding_id = %wedding.id, reason = %reason, "cover upload rejected");
        return Ok(Admission::Rejected(reason));
    }

    let key = cover_key(wedding.id);
    let url = cover_url(wedding.id);
    blobs.put(&key, file.bytes, &file.descriptor.mime_type).await?;
    db::weddings::set_cover(pool, wedding.id, &key, &url, &file.descriptor.mime_type, now).await?;

    tracing::info!(wedding_id = %wedding.id, "cover image replaced");
    Ok(Admission::Accepted(url))
}

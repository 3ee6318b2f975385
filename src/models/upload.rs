use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::MediaKind;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Upload {
    pub id: Uuid,
    pub wedding_id: Uuid,
    pub guest_name: String,
    pub file_name: String,
    pub file_type: MediaKind,
    pub file_size: i64,
    pub mime_type: String,
    /// Hex SHA-256 of the stored bytes.
    pub checksum: String,
    pub device_type: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DbUpload {
    pub id: Uuid,
    pub wedding_id: Uuid,
    pub guest_name: String,
    pub file_key: String,
    pub file_name: String,
    pub file_type: MediaKind,
    pub file_size: i64,
    pub mime_type: String,
    pub checksum: String,
    pub device_type: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<DbUpload> for Upload {
    fn from(value: DbUpload) -> Self {
        Upload {
            id: value.id,
            wedding_id: value.wedding_id,
            guest_name: value.guest_name,
            file_name: value.file_name,
            file_type: value.file_type,
            file_size: value.file_size,
            mime_type: value.mime_type,
            checksum: value.checksum,
            device_type: value.device_type,
            uploaded_at: value.uploaded_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct UploadStats {
    pub total_count: i64,
    pub photo_count: i64,
    pub video_count: i64,
    pub total_size: i64,
    /// Distinct guest names that have uploaded.
    pub guest_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadPage {
    pub uploads: Vec<Upload>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadAccepted {
    pub upload: Upload,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CoverAccepted {
    pub cover_image_url: String,
    pub message: String,
}

/// `page` is 1-based; `limit` is clamped to `1..=100`.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

impl PageQuery {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 100;

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.limit())
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

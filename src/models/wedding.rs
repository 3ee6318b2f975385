use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::{EventFlags, Lifecycle, OwnedResource, PlanId};
use crate::models::plan::PlanView;
use crate::models::upload::UploadStats;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Wedding {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bride_name: String,
    pub groom_name: String,
    #[schema(value_type = String, format = Date, example = "2024-06-01")]
    pub wedding_date: NaiveDate,
    pub wedding_time: Option<String>,
    pub venue_name: Option<String>,
    pub contact_email: String,
    pub plan_id: PlanId,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub upload_disabled: bool,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DbWedding {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bride_name: String,
    pub groom_name: String,
    pub wedding_date: NaiveDate,
    pub wedding_time: Option<String>,
    pub venue_name: Option<String>,
    pub contact_email: String,
    pub plan_id: PlanId,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub upload_disabled: bool,
    pub cover_image_key: Option<String>,
    pub cover_image_url: Option<String>,
    pub cover_content_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbWedding {
    pub fn flags(&self) -> EventFlags {
        EventFlags {
            is_active: self.is_active,
            upload_disabled: self.upload_disabled,
            expires_at: self.expires_at,
            plan: self.plan_id,
        }
    }
}

impl OwnedResource for DbWedding {
    fn owner_tenant_id(&self) -> Uuid {
        self.user_id
    }
}

impl From<DbWedding> for Wedding {
    fn from(value: DbWedding) -> Self {
        Wedding {
            id: value.id,
            user_id: value.user_id,
            bride_name: value.bride_name,
            groom_name: value.groom_name,
            wedding_date: value.wedding_date,
            wedding_time: value.wedding_time,
            venue_name: value.venue_name,
            contact_email: value.contact_email,
            plan_id: value.plan_id,
            expires_at: value.expires_at,
            is_active: value.is_active,
            upload_disabled: value.upload_disabled,
            cover_image_url: value.cover_image_url,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// Owner-submitted event details. Missing `plan_id` falls back to the default tier.
#[derive(Debug, Deserialize, ToSchema)]
pub struct WeddingSaveRequest {
    #[schema(example = "Kim Minji")]
    pub bride_name: String,
    #[schema(example = "Lee Junho")]
    pub groom_name: String,
    #[schema(example = "2024-06-01")]
    pub wedding_date: String,
    #[schema(example = "13:00")]
    pub wedding_time: Option<String>,
    #[schema(example = "Grand Hall")]
    pub venue_name: Option<String>,
    #[schema(example = "minji@example.com")]
    pub contact_email: String,
    pub plan_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlanChangeRequest {
    #[schema(example = "plan_b")]
    pub plan_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WeddingDetail {
    pub wedding: Wedding,
    pub plan: PlanView,
    pub lifecycle: Lifecycle,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MyWeddingResponse {
    pub wedding: Option<WeddingDetail>,
    pub stats: Option<UploadStats>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadToggleResponse {
    pub upload_disabled: bool,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShareLinkResponse {
    pub wedding_id: Uuid,
    /// Guest-facing URL; also the QR code payload.
    pub url: String,
}

/// What an anonymous guest is shown. `upload_disabled` is the effective flag.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicWedding {
    pub id: Uuid,
    pub bride_name: String,
    pub groom_name: String,
    #[schema(value_type = String, format = Date)]
    pub wedding_date: NaiveDate,
    pub wedding_time: Option<String>,
    pub venue_name: Option<String>,
    pub cover_image_url: Option<String>,
    pub plan_id: PlanId,
    pub is_expired: bool,
    pub upload_disabled: bool,
    pub days_remaining: Option<i64>,
}

impl PublicWedding {
    pub fn new(wedding: DbWedding, lifecycle: &Lifecycle) -> Self {
        PublicWedding {
            id: wedding.id,
            bride_name: wedding.bride_name,
            groom_name: wedding.groom_name,
            wedding_date: wedding.wedding_date,
            wedding_time: wedding.wedding_time,
            venue_name: wedding.venue_name,
            cover_image_url: wedding.cover_image_url,
            plan_id: wedding.plan_id,
            is_expired: lifecycle.expired,
            upload_disabled: lifecycle.effective_upload_disabled,
            days_remaining: lifecycle.days_remaining,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::{Lifecycle, Role};
use crate::models::wedding::Wedding;

#[derive(Debug, Serialize, ToSchema)]
pub struct PlanCount {
    pub plan_id: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlatformStats {
    pub total_owners: i64,
    pub total_weddings: i64,
    pub total_uploads: i64,
    pub total_storage_bytes: i64,
    pub total_guests: i64,
    pub plan_distribution: Vec<PlanCount>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminWeddingRow {
    pub wedding: Wedding,
    pub owner_email: Option<String>,
    pub owner_name: Option<String>,
    pub plan_name: String,
    pub upload_count: i64,
    pub total_size: i64,
    pub lifecycle: Lifecycle,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminWeddingPage {
    pub weddings: Vec<AdminWeddingRow>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminUserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub wedding_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminUserPage {
    pub users: Vec<AdminUserRow>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

/// `custom_days` wins over the plan's own duration; at least one field is required.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ExtendPlanRequest {
    #[schema(example = "plan_b")]
    pub plan_id: Option<String>,
    #[schema(example = 30)]
    pub custom_days: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

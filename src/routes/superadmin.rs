use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{authorize_platform_action, lifecycle_of, plan, Principal};
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::models::admin::{
    AdminUserPage, AdminWeddingPage, AdminWeddingRow, ExtendPlanRequest, MessageResponse, PlatformStats,
};
use crate::models::upload::PageQuery;
use crate::models::wedding::WeddingDetail;
use crate::routes::uploads::remove_upload;
use crate::routes::weddings::{detail_of, parse_plan};
use crate::utils::{optional, utc_now};

#[utoipa::path(
    get,
    path = "/api/super/stats",
    tag = "Super Admin",
    responses(
        (status = 200, description = "Platform totals", body = PlatformStats),
        (status = 403, description = "Not a super admin")
    ),
    security(("bearerAuth" = []))
)]
pub async fn stats(State(state): State<AppState>, principal: Principal) -> AppResult<Json<PlatformStats>> {
    authorize_platform_action(&principal).into_result()?;

    let total_owners = db::users::count_owners(&state.pool).await?;
    let total_weddings = db::weddings::count(&state.pool).await?;
    let (total_uploads, total_storage_bytes, total_guests) = db::uploads::platform_totals(&state.pool).await?;
    let plan_distribution = db::weddings::plan_distribution(&state.pool).await?;

    Ok(Json(PlatformStats {
        total_owners,
        total_weddings,
        total_uploads,
        total_storage_bytes,
        total_guests,
        plan_distribution,
    }))
}

#[utoipa::path(
    get,
    path = "/api/super/weddings",
    tag = "Super Admin",
    params(PageQuery),
    responses(
        (status = 200, description = "All events, newest first", body = AdminWeddingPage),
        (status = 403, description = "Not a super admin")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_weddings(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<AdminWeddingPage>> {
    authorize_platform_action(&principal).into_result()?;

    let (records, total) =
        db::weddings::list_all(&state.pool, query.search(), query.limit(), query.offset()).await?;

    let now = utc_now();
    let weddings = records
        .into_iter()
        .map(|record| {
            let lifecycle = lifecycle_of(&record.wedding.flags(), now);
            let plan_name = record.wedding.plan_id.plan().name.to_string();
            AdminWeddingRow {
                wedding: record.wedding.into(),
                owner_email: record.owner_email,
                owner_name: record.owner_name,
                plan_name,
                upload_count: record.upload_count,
                total_size: record.total_size,
                lifecycle,
            }
        })
        .collect();

    Ok(Json(AdminWeddingPage {
        weddings,
        total,
        page: query.page(),
        limit: query.limit(),
    }))
}

#[utoipa::path(
    put,
    path = "/api/super/weddings/{id}/disable",
    tag = "Super Admin",
    params(("id" = Uuid, Path, description = "Wedding id")),
    responses(
        (status = 200, description = "Event hidden from guests", body = MessageResponse),
        (status = 404, description = "Unknown wedding")
    ),
    security(("bearerAuth" = []))
)]
pub async fn disable_wedding(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    set_active(&state, &principal, id, false).await?;
    Ok(Json(MessageResponse::new("Wedding deactivated")))
}

#[utoipa::path(
    put,
    path = "/api/super/weddings/{id}/enable",
    tag = "Super Admin",
    params(("id" = Uuid, Path, description = "Wedding id")),
    responses(
        (status = 200, description = "Event visible again", body = MessageResponse),
        (status = 404, description = "Unknown wedding")
    ),
    security(("bearerAuth" = []))
)]
pub async fn enable_wedding(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    set_active(&state, &principal, id, true).await?;
    Ok(Json(MessageResponse::new("Wedding activated")))
}

async fn set_active(state: &AppState, principal: &Principal, id: Uuid, active: bool) -> AppResult<()> {
    authorize_platform_action(principal).into_result()?;

    if !db::weddings::set_active(&state.pool, id, active, utc_now()).await? {
        return Err(AppError::not_found("wedding not found"));
    }

    tracing::info!(wedding_id = %id, is_active = active, "wedding activation changed");
    Ok(())
}

#[utoipa::path(
    put,
    path = "/api/super/weddings/{id}/extend-plan",
    tag = "Super Admin",
    params(("id" = Uuid, Path, description = "Wedding id")),
    request_body = ExtendPlanRequest,
    responses(
        (status = 200, description = "Plan or expiry overridden", body = WeddingDetail),
        (status = 400, description = "Unknown plan, or neither plan_id nor custom_days given"),
        (status = 404, description = "Unknown wedding")
    ),
    security(("bearerAuth" = []))
)]
pub async fn extend_plan(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExtendPlanRequest>,
) -> AppResult<Json<WeddingDetail>> {
    authorize_platform_action(&principal).into_result()?;

    let wedding = db::weddings::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("wedding not found"))?;

    let requested_plan = optional(payload.plan_id.as_deref()).map(parse_plan).transpose()?;
    let plan_id = requested_plan.unwrap_or(wedding.plan_id);
    let expires_at = match (payload.custom_days, requested_plan) {
        (Some(days), _) => plan::expiry_of(wedding.wedding_date, Some(days)),
        (None, Some(plan_id)) => plan_id.plan().expiry_for(wedding.wedding_date),
        (None, None) => return Err(AppError::bad_request("plan_id or custom_days is required")),
    };

    let now = utc_now();
    let wedding = db::weddings::set_plan(&state.pool, id, plan_id, expires_at, now).await?;

    tracing::info!(
        wedding_id = %id,
        plan = %plan_id,
        custom_days = ?payload.custom_days,
        "plan overridden by super admin"
    );
    Ok(Json(detail_of(wedding, now)))
}

#[utoipa::path(
    delete,
    path = "/api/super/uploads/{id}",
    tag = "Super Admin",
    params(("id" = Uuid, Path, description = "Upload id")),
    responses(
        (status = 200, description = "Upload and blob removed", body = MessageResponse),
        (status = 404, description = "Unknown upload")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_upload(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    authorize_platform_action(&principal).into_result()?;
    remove_upload(&state, &principal, id).await?;
    Ok(Json(MessageResponse::new("Upload deleted")))
}

#[utoipa::path(
    get,
    path = "/api/super/users",
    tag = "Super Admin",
    params(PageQuery),
    responses(
        (status = 200, description = "Owner accounts with event counts", body = AdminUserPage),
        (status = 403, description = "Not a super admin")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<AdminUserPage>> {
    authorize_platform_action(&principal).into_result()?;

    let (users, total) = db::users::list_owners(&state.pool, query.search(), query.limit(), query.offset()).await?;
    Ok(Json(AdminUserPage {
        users,
        total,
        page: query.page(),
        limit: query.limit(),
    }))
}

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{authorize_owner_action, lifecycle_of, GuestAccess, PlanId, Principal};
use crate::db;
use crate::db::weddings::WeddingDetails;
use crate::errors::{AppError, AppResult};
use crate::models::plan::PlanView;
use crate::models::wedding::{
    DbWedding, MyWeddingResponse, PlanChangeRequest, PublicWedding, ShareLinkResponse, UploadToggleResponse,
    WeddingDetail, WeddingSaveRequest,
};
use crate::utils::{is_valid_email, optional, required, utc_now};

#[utoipa::path(
    post,
    path = "/api/weddings",
    tag = "Weddings",
    request_body = WeddingSaveRequest,
    responses(
        (status = 200, description = "Event created or updated", body = WeddingDetail),
        (status = 400, description = "Invalid fields or unknown plan"),
        (status = 403, description = "Not an event owner"),
        (status = 409, description = "Concurrent creation for the same account")
    ),
    security(("bearerAuth" = []))
)]
pub async fn save_wedding(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<WeddingSaveRequest>,
) -> AppResult<Json<WeddingDetail>> {
    let tenant_id = owner_tenant(&principal)?;

    let wedding_date = parse_wedding_date(&payload.wedding_date)?;
    let contact_email = required("contact_email", &payload.contact_email)?;
    if !is_valid_email(contact_email) {
        return Err(AppError::bad_request("invalid contact email"));
    }
    let requested_plan = optional(payload.plan_id.as_deref()).map(parse_plan).transpose()?;

    let now = utc_now();
    let existing = db::weddings::find_by_user(&state.pool, tenant_id).await?;
    let plan_id = requested_plan
        .or_else(|| existing.as_ref().map(|w| w.plan_id))
        .unwrap_or_default();

    let details = WeddingDetails {
        bride_name: required("bride_name", &payload.bride_name)?,
        groom_name: required("groom_name", &payload.groom_name)?,
        wedding_date,
        wedding_time: optional(payload.wedding_time.as_deref()),
        venue_name: optional(payload.venue_name.as_deref()),
        contact_email,
        plan_id,
        // anchored on the wedding day, not on today
        expires_at: plan_id.plan().expiry_for(wedding_date),
    };

    let wedding = match existing {
        Some(existing) => {
            authorize_owner_action(&principal, &existing).into_result()?;
            db::weddings::update_details(&state.pool, existing.id, &details, now).await?
        }
        None => {
            let created = db::weddings::insert(&state.pool, tenant_id, &details, now).await?;
            tracing::info!(wedding_id = %created.id, tenant_id = %tenant_id, "wedding created");
            created
        }
    };

    Ok(Json(detail_of(wedding, now)))
}

#[utoipa::path(
    get,
    path = "/api/weddings/my",
    tag = "Weddings",
    responses(
        (status = 200, description = "Own event with lifecycle and upload stats", body = MyWeddingResponse),
        (status = 403, description = "Not an event owner")
    ),
    security(("bearerAuth" = []))
)]
pub async fn my_wedding(State(state): State<AppState>, principal: Principal) -> AppResult<Json<MyWeddingResponse>> {
    let tenant_id = owner_tenant(&principal)?;

    let Some(wedding) = db::weddings::find_by_user(&state.pool, tenant_id).await? else {
        return Ok(Json(MyWeddingResponse { wedding: None, stats: None }));
    };
    authorize_owner_action(&principal, &wedding).into_result()?;

    // Deactivation hides the event from guests only; the owner keeps their dashboard.
    let stats = db::uploads::stats_for_wedding(&state.pool, wedding.id).await?;
    Ok(Json(MyWeddingResponse {
        wedding: Some(detail_of(wedding, utc_now())),
        stats: Some(stats),
    }))
}

#[utoipa::path(
    put,
    path = "/api/weddings/plan",
    tag = "Weddings",
    request_body = PlanChangeRequest,
    responses(
        (status = 200, description = "Plan changed, expiry re-anchored on the wedding date", body = WeddingDetail),
        (status = 400, description = "Unknown plan"),
        (status = 404, description = "No event yet")
    ),
    security(("bearerAuth" = []))
)]
pub async fn change_plan(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<PlanChangeRequest>,
) -> AppResult<Json<WeddingDetail>> {
    let plan_id = parse_plan(payload.plan_id.trim())?;
    let wedding = owned_wedding(&state, &principal).await?;

    let now = utc_now();
    let expires_at = plan_id.plan().expiry_for(wedding.wedding_date);
    let wedding = db::weddings::set_plan(&state.pool, wedding.id, plan_id, expires_at, now).await?;

    tracing::info!(wedding_id = %wedding.id, plan = %plan_id, "plan changed");
    Ok(Json(detail_of(wedding, now)))
}

#[utoipa::path(
    put,
    path = "/api/weddings/toggle-upload",
    tag = "Weddings",
    responses(
        (status = 200, description = "Guest uploads toggled", body = UploadToggleResponse),
        (status = 404, description = "No event yet")
    ),
    security(("bearerAuth" = []))
)]
pub async fn toggle_upload(
    State(state): State<AppState>,
    principal: Principal,
) -> AppResult<Json<UploadToggleResponse>> {
    let wedding = owned_wedding(&state, &principal).await?;

    let upload_disabled = !wedding.upload_disabled;
    db::weddings::set_upload_disabled(&state.pool, wedding.id, upload_disabled, utc_now()).await?;

    tracing::info!(wedding_id = %wedding.id, upload_disabled, "guest uploads toggled");
    let message = if upload_disabled {
        "Guest uploads paused"
    } else {
        "Guest uploads resumed"
    };
    Ok(Json(UploadToggleResponse {
        upload_disabled,
        message: message.to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/weddings/my/share",
    tag = "Weddings",
    responses(
        (status = 200, description = "Guest link, also the QR code payload", body = ShareLinkResponse),
        (status = 404, description = "No event yet")
    ),
    security(("bearerAuth" = []))
)]
pub async fn share_link(State(state): State<AppState>, principal: Principal) -> AppResult<Json<ShareLinkResponse>> {
    let wedding = owned_wedding(&state, &principal).await?;
    Ok(Json(ShareLinkResponse {
        wedding_id: wedding.id,
        url: state.config.share_url(wedding.id),
    }))
}

#[utoipa::path(
    get,
    path = "/api/weddings/{id}/public",
    tag = "Weddings",
    params(("id" = Uuid, Path, description = "Wedding id")),
    responses(
        (status = 200, description = "Guest view of the event", body = PublicWedding),
        (status = 404, description = "Missing or deactivated event")
    )
)]
pub async fn public_wedding(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Json<PublicWedding>> {
    let wedding = visible_wedding(&state, id).await?;
    let lifecycle = lifecycle_of(&wedding.flags(), utc_now());
    Ok(Json(PublicWedding::new(wedding, &lifecycle)))
}

/// Event as a guest may see it; missing and deactivated are the same answer.
pub(crate) async fn visible_wedding(state: &AppState, id: Uuid) -> AppResult<DbWedding> {
    let wedding = db::weddings::find_by_id(&state.pool, id).await?;
    match wedding {
        Some(w) if lifecycle_of(&w.flags(), utc_now()).guest_access() != GuestAccess::NotFound => Ok(w),
        _ => Err(AppError::not_found("wedding not found")),
    }
}

/// Owner-only actions need a tenant; super admins have none.
pub(crate) fn owner_tenant(principal: &Principal) -> AppResult<Uuid> {
    principal
        .tenant_id()
        .ok_or_else(|| AppError::forbidden("only event owners can do this"))
}

/// The caller's own event, guard applied.
pub(crate) async fn owned_wedding(state: &AppState, principal: &Principal) -> AppResult<DbWedding> {
    let tenant_id = owner_tenant(principal)?;
    let wedding = db::weddings::find_by_user(&state.pool, tenant_id)
        .await?
        .ok_or_else(|| AppError::not_found("wedding not found"))?;

    authorize_owner_action(principal, &wedding).into_result()?;
    Ok(wedding)
}

pub(crate) fn detail_of(wedding: DbWedding, now: DateTime<Utc>) -> WeddingDetail {
    let lifecycle = lifecycle_of(&wedding.flags(), now);
    let plan = PlanView::from(wedding.plan_id.plan());
    WeddingDetail {
        wedding: wedding.into(),
        plan,
        lifecycle,
    }
}

pub(crate) fn parse_plan(raw: &str) -> AppResult<PlanId> {
    raw.parse::<PlanId>().map_err(|e| AppError::bad_request(e.to_string()))
}

fn parse_wedding_date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::bad_request("wedding_date must be YYYY-MM-DD"))
}

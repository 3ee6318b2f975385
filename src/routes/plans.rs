use axum::Json;

use crate::authz::PLANS;
use crate::models::plan::PlanView;

#[utoipa::path(
    get,
    path = "/api/plans",
    tag = "Plans",
    responses((status = 200, description = "Plan catalogue", body = [PlanView]))
)]
pub async fn list_plans() -> Json<Vec<PlanView>> {
    Json(PLANS.iter().map(PlanView::from).collect())
}

use serde::Serialize;
use utoipa::ToSchema;

use crate::authz::{Plan, PlanId};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlanView {
    pub id: PlanId,
    pub name: String,
    pub description: String,
    /// Absent for the lifetime tier.
    pub duration_days: Option<u32>,
}

impl From<&Plan> for PlanView {
    fn from(plan: &Plan) -> Self {
        PlanView {
            id: plan.id,
            name: plan.name.to_string(),
            description: plan.description.to_string(),
            duration_days: plan.duration_days,
        }
    }
}

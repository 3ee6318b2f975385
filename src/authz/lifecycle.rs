//! Derived lifecycle of a wedding event.
//!
//! Nothing here is persisted: visibility and writability are recomputed from
//! the stored flags and the current time on every request. Deactivation by a
//! super admin outranks everything else; expiry and the owner's upload toggle
//! only ever close uploads, never reads.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::plan::{self, PlanId};

/// Stored state the lifecycle is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventFlags {
    pub is_active: bool,
    pub upload_disabled: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub plan: PlanId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Lifecycle {
    pub deactivated: bool,
    pub expired: bool,
    pub effective_upload_disabled: bool,
    pub days_remaining: Option<i64>,
}

/// What an anonymous guest gets when opening the event page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestAccess {
    /// Indistinguishable from a missing event.
    NotFound,
    /// Page renders, uploads are closed.
    ReadOnly,
    Open,
}

pub fn lifecycle_of(flags: &EventFlags, now: DateTime<Utc>) -> Lifecycle {
    let deactivated = !flags.is_active;
    let expired = plan::is_expired(flags.expires_at, now);
    // The lifetime tier is exempt from expiry lockout even if an override gave it an expiry.
    let expiry_lockout = expired && !flags.plan.plan().is_unlimited();

    Lifecycle {
        deactivated,
        expired,
        effective_upload_disabled: flags.upload_disabled || expiry_lockout,
        days_remaining: plan::days_remaining(flags.expires_at, now),
    }
}

impl Lifecycle {
    pub fn guest_access(&self) -> GuestAccess {
        if self.deactivated {
            GuestAccess::NotFound
        } else if self.effective_upload_disabled {
            GuestAccess::ReadOnly
        } else {
            GuestAccess::Open
        }
    }

    pub fn accepts_guest_uploads(&self) -> bool {
        self.guest_access() == GuestAccess::Open
    }
}

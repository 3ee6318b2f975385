//! Authorization core.
//!
//! - identity: bearer credential -> principal
//! - ownership: tenant guard for owner actions, super admin bypass
//! - plan / lifecycle: expiry arithmetic and the derived event state
//! - admission: guest and cover upload screening

pub mod admission;
mod identity;
mod lifecycle;
mod ownership;
pub mod plan;
mod principal;

pub use admission::{Admission, FileDescriptor, IncomingFile, MediaKind, Rejection};
pub use identity::{credential_from_headers, resolve_principal, resolve_session, IdentityError, Session, TokenVerifier};
pub use lifecycle::{lifecycle_of, EventFlags, GuestAccess, Lifecycle};
pub use ownership::{authorize, authorize_owner_action, authorize_platform_action, Decision, OwnedResource};
pub use plan::{Plan, PlanId, UnknownPlan, PLANS};
pub use principal::{Principal, Role, UnknownRole};

/// Role names as they appear in tokens and the `users.role` column.
pub mod roles {
    pub const OWNER: &str = "admin";
    pub const SUPER_ADMIN: &str = "superadmin";
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Account role as persisted and carried in token claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Role {
    /// A tenant owner managing their own wedding event.
    #[serde(rename = "admin")]
    Owner,
    /// Platform operator overseeing every tenant.
    #[serde(rename = "superadmin")]
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => super::roles::OWNER,
            Role::SuperAdmin => super::roles::SUPER_ADMIN,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Unrecognised roles are an error, never a silent downgrade.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            super::roles::OWNER => Ok(Role::Owner),
            super::roles::SUPER_ADMIN => Ok(Role::SuperAdmin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// The resolved identity making a request. Derived per request, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    Anonymous,
    Owner { tenant_id: Uuid },
    SuperAdmin,
}

impl Principal {
    pub fn from_role(subject_id: Uuid, role: Role) -> Self {
        match role {
            Role::Owner => Principal::Owner { tenant_id: subject_id },
            Role::SuperAdmin => Principal::SuperAdmin,
        }
    }

    pub fn is_super_admin(&self) -> bool {
        matches!(self, Principal::SuperAdmin)
    }

    /// The tenant this principal acts for, if it is an owner.
    pub fn tenant_id(&self) -> Option<Uuid> {
        match self {
            Principal::Owner { tenant_id } => Some(*tenant_id),
            _ => None,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::Anonymous => f.write_str("anonymous"),
            Principal::Owner { tenant_id } => write!(f, "owner:{tenant_id}"),
            Principal::SuperAdmin => f.write_str("superadmin"),
        }
    }
}

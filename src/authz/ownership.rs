use uuid::Uuid;

use super::principal::Principal;

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Forbidden,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

/// Anything scoped to exactly one tenant.
pub trait OwnedResource {
    fn owner_tenant_id(&self) -> Uuid;
}

/// Ownership guard for tenant-scoped operations.
///
/// Evaluation order:
/// 1. super admin -> allow
/// 2. owner of the resource's tenant -> allow
/// 3. deny (including anonymous callers, which should never get this far)
pub fn authorize(principal: &Principal, resource_owner: Uuid) -> Decision {
    let decision = match principal {
        Principal::SuperAdmin => Decision::Allowed,
        Principal::Owner { tenant_id } if *tenant_id == resource_owner => Decision::Allowed,
        Principal::Owner { .. } | Principal::Anonymous => Decision::Forbidden,
    };

    tracing::debug!(
        principal = %principal,
        resource_owner = %resource_owner,
        decision = ?decision,
        "ownership check"
    );
    decision
}

pub fn authorize_owner_action<R: OwnedResource + ?Sized>(principal: &Principal, resource: &R) -> Decision {
    authorize(principal, resource.owner_tenant_id())
}

/// Platform-wide operations (activation, plan overrides, tenant listings).
pub fn authorize_platform_action(principal: &Principal) -> Decision {
    if principal.is_super_admin() {
        Decision::Allowed
    } else {
        tracing::debug!(principal = %principal, "platform action denied");
        Decision::Forbidden
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Owned(Uuid);

    impl OwnedResource for Owned {
        fn owner_tenant_id(&self) -> Uuid {
            self.0
        }
    }

    #[test]
    fn super_admin_is_allowed_on_any_tenant() {
        for _ in 0..16 {
            assert_eq!(authorize(&Principal::SuperAdmin, Uuid::new_v4()), Decision::Allowed);
        }
    }

    #[test]
    fn owners_reach_only_their_own_tenant() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let owner_a = Principal::Owner { tenant_id: a };

        assert_eq!(authorize_owner_action(&owner_a, &Owned(a)), Decision::Allowed);
        assert_eq!(authorize_owner_action(&owner_a, &Owned(b)), Decision::Forbidden);
    }

    #[test]
    fn anonymous_is_always_denied() {
        assert_eq!(authorize(&Principal::Anonymous, Uuid::nil()), Decision::Forbidden);
        assert_eq!(authorize_platform_action(&Principal::Anonymous), Decision::Forbidden);
    }

    #[test]
    fn only_super_admin_passes_platform_checks() {
        assert!(authorize_platform_action(&Principal::SuperAdmin).is_allowed());
        assert!(!authorize_platform_action(&Principal::Owner { tenant_id: Uuid::new_v4() }).is_allowed());
    }
}

//! Permission guard for route handlers.
//!
//! Runs before any service call so domain crates and infra stay auth-agnostic.

use axum::http::StatusCode;
use axum::response::Response;

use bazaar_auth::{AuthzError, Permission, Principal, TenantMembership, authorize};

use crate::app::errors;
use crate::context::{PrincipalContext, TenantContext};

/// Check `required` for the current request context.
pub fn check_permission(
    tenant: &TenantContext,
    principal: &PrincipalContext,
    required: &'static str,
) -> Result<(), AuthzError> {
    let membership = TenantMembership {
        tenant_id: tenant.tenant_id(),
        roles: principal.roles().to_vec(),
        permissions: principal.permissions(),
    };

    let principal = Principal {
        user_id: principal.user_id(),
        active_tenant_id: tenant.tenant_id(),
        membership,
    };

    authorize(&principal, &Permission::new(required))
}

/// `check_permission` mapped to a 403 response for early return.
pub fn require_permission(
    tenant: &TenantContext,
    principal: &PrincipalContext,
    required: &'static str,
) -> Result<(), Response> {
    check_permission(tenant, principal, required)
        .map_err(|e| errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_auth::Role;
    use bazaar_core::{TenantId, UserId};

    #[test]
    fn vendor_can_request_payouts_but_not_approve_them() {
        let tenant = TenantContext::new(TenantId::new());
        let vendor = PrincipalContext::new(UserId::new(), vec![Role::vendor()]);
        assert!(check_permission(&tenant, &vendor, "payouts.request").is_ok());
        assert_eq!(
            check_permission(&tenant, &vendor, "payouts.approve"),
            Err(AuthzError::Forbidden("payouts.approve".into()))
        );
    }

    #[test]
    fn roleless_principal_gets_nothing() {
        let tenant = TenantContext::new(TenantId::new());
        let nobody = PrincipalContext::new(UserId::new(), Vec::new());
        assert!(check_permission(&tenant, &nobody, "games.play").is_err());
    }
}

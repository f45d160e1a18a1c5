use bazaar_auth::{Permission, Role, permissions_for_roles};
use bazaar_core::{TenantId, UserId};

/// Tenant context for a request.
///
/// This is immutable and must be present for all `/api` routes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TenantContext {
    tenant_id: TenantId,
}

impl TenantContext {
    pub fn new(tenant_id: TenantId) -> Self {
        Self { tenant_id }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Principal context for a request (authenticated user + roles).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
    roles: Vec<Role>,
}

impl PrincipalContext {
    pub fn new(user_id: UserId, roles: Vec<Role>) -> Self {
        Self { user_id, roles }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn permissions(&self) -> Vec<Permission> {
        permissions_for_roles(&self.roles)
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r.as_str() == Role::ADMIN)
    }
}

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Role;

/// Permission identifier.
///
/// Permissions are opaque strings (e.g. `"loyalty.redeem"`). The wildcard
/// `"*"` grants everything within the active tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

const CUSTOMER_PERMISSIONS: &[&str] = &[
    "games.play",
    "loyalty.read",
    "loyalty.redeem",
    "exports.request",
    "exports.read",
    "orders.create",
    "orders.read",
];

const VENDOR_PERMISSIONS: &[&str] = &["vendor.manage", "payouts.request", "orders.fulfil"];

/// Static role → permission policy.
///
/// `admin` maps to the wildcard. `vendor` includes everything a customer can
/// do. Unknown roles grant nothing.
pub fn permissions_for_roles(roles: &[Role]) -> Vec<Permission> {
    if roles.iter().any(|r| r.as_str() == Role::ADMIN) {
        return vec![Permission::new("*")];
    }

    let mut out: Vec<Permission> = Vec::new();
    let mut grant = |names: &[&'static str]| {
        for name in names {
            let p = Permission::new(*name);
            if !out.contains(&p) {
                out.push(p);
            }
        }
    };

    for role in roles {
        match role.as_str() {
            Role::CUSTOMER => grant(CUSTOMER_PERMISSIONS),
            Role::VENDOR => {
                grant(CUSTOMER_PERMISSIONS);
                grant(VENDOR_PERMISSIONS);
            }
            _ => {}
        }
    }

    out
}

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier carried in tokens.
///
/// Roles are opaque strings; `permissions::permissions_for_roles` maps the
/// ones the marketplace knows about (`customer`, `vendor`, `admin`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const CUSTOMER: &'static str = "customer";
    pub const VENDOR: &'static str = "vendor";
    pub const ADMIN: &'static str = "admin";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn customer() -> Self {
        Self::new(Self::CUSTOMER)
    }

    pub fn vendor() -> Self {
        Self::new(Self::VENDOR)
    }

    pub fn admin() -> Self {
        Self::new(Self::ADMIN)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

//! `bazaar-auth` — authentication and authorization boundary.
//!
//! Decoupled from HTTP and storage: the API layer extracts a token, this crate
//! turns it into claims and answers permission checks.

pub mod authorize;
pub mod claims;
pub mod cron;
pub mod jwt;
pub mod permissions;
pub mod roles;

pub use authorize::{authorize, AuthzError, Principal, TenantMembership};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use cron::CronSecret;
pub use jwt::{Hs256JwtValidator, JwtValidator, TokenError, TokenIssuer};
pub use permissions::{Permission, permissions_for_roles};
pub use roles::Role;

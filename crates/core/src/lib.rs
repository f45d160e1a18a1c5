//! `bazaar-core` — shared marketplace building blocks.
//!
//! Identifiers, the domain error model, money arithmetic and optimistic
//! version checks. No IO lives here.

pub mod error;
pub mod id;
pub mod money;
pub mod version;

pub use error::{DomainError, DomainResult};
pub use id::{
    CampaignId, CouponId, ExportRequestId, OrderId, PayoutId, ProductId, TenantId, UserId,
    VendorId,
};
pub use money::Money;
pub use version::{ExpectedVersion, Versioned};

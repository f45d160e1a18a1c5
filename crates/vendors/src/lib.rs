//! Marketplace sellers: verification lifecycle, sale balances and payouts.

pub mod payout;
pub mod vendor;

pub use payout::{MIN_PAYOUT, Payout, PayoutStatus};
pub use vendor::{COMMISSION_PERCENT, Vendor, VendorBalance, VendorStatus};

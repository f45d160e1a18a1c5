use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, DomainResult, Money, PayoutId, TenantId, VendorId};

use crate::vendor::Vendor;

pub const MIN_PAYOUT: Money = Money::from_cents(1_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Requested,
    Approved,
    Paid,
    Rejected,
}

impl PayoutStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PayoutStatus::Requested => "requested",
            PayoutStatus::Approved => "approved",
            PayoutStatus::Paid => "paid",
            PayoutStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub id: PayoutId,
    pub tenant_id: TenantId,
    pub vendor_id: VendorId,
    pub amount: Money,
    pub status: PayoutStatus,
    pub note: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Payout {
    /// Validates the request and moves `amount` from available to held.
    pub fn request(vendor: &mut Vendor, amount: Money, now: DateTime<Utc>) -> DomainResult<Self> {
        if !vendor.is_verified() {
            return Err(DomainError::invariant("only verified vendors can request payouts"));
        }
        if amount < MIN_PAYOUT {
            return Err(DomainError::validation(format!("minimum payout is {MIN_PAYOUT}")));
        }
        vendor.hold(amount, now)?;
        Ok(Self {
            id: PayoutId::new(),
            tenant_id: vendor.tenant_id,
            vendor_id: vendor.id,
            amount,
            status: PayoutStatus::Requested,
            note: None,
            requested_at: now,
            decided_at: None,
            paid_at: None,
        })
    }

    fn ensure_vendor(&self, vendor: &Vendor) -> DomainResult<()> {
        if vendor.id != self.vendor_id {
            return Err(DomainError::invariant("payout belongs to another vendor"));
        }
        Ok(())
    }

    fn ensure_status(&self, allowed: &[PayoutStatus], action: &str) -> DomainResult<()> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(DomainError::invariant(format!(
                "cannot {action} a {} payout",
                self.status.as_str()
            )))
        }
    }

    pub fn approve(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_status(&[PayoutStatus::Requested], "approve")?;
        self.status = PayoutStatus::Approved;
        self.decided_at = Some(now);
        Ok(())
    }

    pub fn reject(&mut self, vendor: &mut Vendor, note: Option<String>, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_vendor(vendor)?;
        self.ensure_status(&[PayoutStatus::Requested, PayoutStatus::Approved], "reject")?;
        vendor.release(self.amount, now)?;
        self.status = PayoutStatus::Rejected;
        self.note = note;
        self.decided_at = Some(now);
        Ok(())
    }

    pub fn mark_paid(&mut self, vendor: &mut Vendor, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_vendor(vendor)?;
        self.ensure_status(&[PayoutStatus::Approved], "pay")?;
        vendor.settle(self.amount, now)?;
        self.status = PayoutStatus::Paid;
        self.paid_at = Some(now);
        Ok(())
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, DomainResult, Money, TenantId, UserId, VendorId};

/// Marketplace cut taken from each delivered sale.
pub const COMMISSION_PERCENT: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorStatus {
    Pending,
    Verified,
    Rejected,
    Suspended,
}

impl VendorStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VendorStatus::Pending => "pending",
            VendorStatus::Verified => "verified",
            VendorStatus::Rejected => "rejected",
            VendorStatus::Suspended => "suspended",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorBalance {
    pub available: Money,
    /// Reserved by payouts that are requested or approved.
    pub held: Money,
    pub lifetime_sales: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub tenant_id: TenantId,
    pub owner_id: UserId,
    pub display_name: String,
    pub status: VendorStatus,
    pub rejection_reason: Option<String>,
    pub balance: VendorBalance,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vendor {
    pub fn apply(
        tenant_id: TenantId,
        owner_id: UserId,
        display_name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let display_name = display_name.into();
        if display_name.trim().is_empty() {
            return Err(DomainError::validation("display_name must not be empty"));
        }
        Ok(Self {
            id: VendorId::new(),
            tenant_id,
            owner_id,
            display_name,
            status: VendorStatus::Pending,
            rejection_reason: None,
            balance: VendorBalance::default(),
            created_at: now,
            updated_at: now,
        })
    }

    fn move_to(&mut self, from: &[VendorStatus], to: VendorStatus, now: DateTime<Utc>) -> DomainResult<()> {
        if !from.contains(&self.status) {
            return Err(DomainError::invariant(format!(
                "vendor cannot move from {} to {}",
                self.status.as_str(),
                to.as_str()
            )));
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }

    pub fn verify(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.move_to(&[VendorStatus::Pending], VendorStatus::Verified, now)?;
        self.rejection_reason = None;
        Ok(())
    }

    pub fn reject(&mut self, reason: &str, now: DateTime<Utc>) -> DomainResult<()> {
        if reason.trim().is_empty() {
            return Err(DomainError::validation("rejection reason is required"));
        }
        self.move_to(&[VendorStatus::Pending], VendorStatus::Rejected, now)?;
        self.rejection_reason = Some(reason.trim().to_string());
        Ok(())
    }

    pub fn suspend(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.move_to(&[VendorStatus::Verified], VendorStatus::Suspended, now)
    }

    pub fn reinstate(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.move_to(&[VendorStatus::Suspended], VendorStatus::Verified, now)
    }

    pub fn is_verified(&self) -> bool {
        self.status == VendorStatus::Verified
    }

    /// Credit a delivered sale net of commission. Returns the credited amount.
    pub fn credit_sale(&mut self, gross: Money, now: DateTime<Utc>) -> DomainResult<Money> {
        let commission = gross.percent(COMMISSION_PERCENT);
        let net = gross.checked_sub(commission)?;
        self.balance.available = self.balance.available.checked_add(net)?;
        self.balance.lifetime_sales = self.balance.lifetime_sales.checked_add(gross)?;
        self.updated_at = now;
        Ok(net)
    }

    pub fn hold(&mut self, amount: Money, now: DateTime<Utc>) -> DomainResult<()> {
        if amount > self.balance.available {
            return Err(DomainError::validation(format!(
                "payout of {amount} exceeds available balance {}",
                self.balance.available
            )));
        }
        self.balance.available = self.balance.available.checked_sub(amount)?;
        self.balance.held = self.balance.held.checked_add(amount)?;
        self.updated_at = now;
        Ok(())
    }

    pub fn release(&mut self, amount: Money, now: DateTime<Utc>) -> DomainResult<()> {
        self.balance.held = self.balance.held.checked_sub(amount)?;
        self.balance.available = self.balance.available.checked_add(amount)?;
        self.updated_at = now;
        Ok(())
    }

    /// Held funds leave the platform.
    pub fn settle(&mut self, amount: Money, now: DateTime<Utc>) -> DomainResult<()> {
        self.balance.held = self.balance.held.checked_sub(amount)?;
        self.updated_at = now;
        Ok(())
    }
}

//! Vendor profiles, balances and payout requests.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use bazaar_core::{DomainError, Money, PayoutId, TenantId, UserId, VendorId};
use bazaar_vendors::{Payout, Vendor};

use crate::error::StoreError;
use crate::read_model::{InMemoryTenantStore, TenantStore};

/// Admin decision on a vendor application or standing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VendorDecision {
    Verify,
    Reject { reason: String },
    Suspend,
    Reinstate,
}

/// Admin decision on a payout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayoutDecision {
    Approve,
    Reject { note: Option<String> },
    MarkPaid,
}

pub struct VendorService {
    vendors: Arc<dyn TenantStore<VendorId, Vendor>>,
    payouts: Arc<dyn TenantStore<PayoutId, Payout>>,
    /// Serialises writes that touch a vendor balance together with another record.
    ledger: Mutex<()>,
}

impl Default for VendorService {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryTenantStore::new()), Arc::new(InMemoryTenantStore::new()))
    }
}

impl VendorService {
    pub fn new(
        vendors: Arc<dyn TenantStore<VendorId, Vendor>>,
        payouts: Arc<dyn TenantStore<PayoutId, Payout>>,
    ) -> Self {
        Self {
            vendors,
            payouts,
            ledger: Mutex::new(()),
        }
    }

    pub fn apply(
        &self,
        tenant_id: TenantId,
        owner_id: UserId,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Vendor, StoreError> {
        let _guard = self.ledger.lock().map_err(|_| StoreError::poisoned())?;
        if self.for_owner(tenant_id, owner_id)?.is_some() {
            return Err(DomainError::conflict("user already has a vendor profile").into());
        }
        let vendor = Vendor::apply(tenant_id, owner_id, display_name, now)?;
        self.vendors.upsert(tenant_id, vendor.id, vendor.clone())?;
        tracing::info!(tenant_id = %tenant_id, vendor_id = %vendor.id, "vendor application received");
        Ok(vendor)
    }

    pub fn get(&self, tenant_id: TenantId, vendor_id: VendorId) -> Result<Vendor, StoreError> {
        self.vendors
            .get(tenant_id, &vendor_id)?
            .ok_or_else(|| DomainError::NotFound.into())
    }

    pub fn for_owner(&self, tenant_id: TenantId, owner_id: UserId) -> Result<Option<Vendor>, StoreError> {
        Ok(self
            .vendors
            .list(tenant_id)?
            .into_iter()
            .find(|v| v.owner_id == owner_id))
    }

    pub fn list(&self, tenant_id: TenantId) -> Result<Vec<Vendor>, StoreError> {
        let mut vendors = self.vendors.list(tenant_id)?;
        vendors.sort_by_key(|v| v.created_at);
        Ok(vendors)
    }

    pub fn decide(
        &self,
        tenant_id: TenantId,
        vendor_id: VendorId,
        decision: VendorDecision,
        now: DateTime<Utc>,
    ) -> Result<Vendor, StoreError> {
        let _guard = self.ledger.lock().map_err(|_| StoreError::poisoned())?;
        let vendor = self.vendors.modify(tenant_id, &vendor_id, &mut |v| match &decision {
            VendorDecision::Verify => v.verify(now),
            VendorDecision::Reject { reason } => v.reject(reason, now),
            VendorDecision::Suspend => v.suspend(now),
            VendorDecision::Reinstate => v.reinstate(now),
        })?;
        tracing::info!(
            tenant_id = %tenant_id,
            vendor_id = %vendor_id,
            status = vendor.status.as_str(),
            "vendor status changed"
        );
        Ok(vendor)
    }

    /// Credit a delivered sale to the vendor, net of commission.
    pub fn credit_sale(
        &self,
        tenant_id: TenantId,
        vendor_id: VendorId,
        gross: Money,
        now: DateTime<Utc>,
    ) -> Result<Money, StoreError> {
        let _guard = self.ledger.lock().map_err(|_| StoreError::poisoned())?;
        let mut net = Money::ZERO;
        self.vendors.modify(tenant_id, &vendor_id, &mut |v| {
            net = v.credit_sale(gross, now)?;
            Ok(())
        })?;
        tracing::info!(tenant_id = %tenant_id, vendor_id = %vendor_id, gross = %gross, net = %net, "vendor credited");
        Ok(net)
    }

    pub fn request_payout(
        &self,
        tenant_id: TenantId,
        owner_id: UserId,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<Payout, StoreError> {
        let _guard = self.ledger.lock().map_err(|_| StoreError::poisoned())?;
        let vendor = self
            .for_owner(tenant_id, owner_id)?
            .ok_or(DomainError::NotFound)?;

        let mut payout = None;
        self.vendors.modify(tenant_id, &vendor.id, &mut |v| {
            payout = Some(Payout::request(v, amount, now)?);
            Ok(())
        })?;
        let payout = payout.ok_or_else(|| StoreError::backend("payout was not created"))?;
        self.payouts.upsert(tenant_id, payout.id, payout.clone())?;

        tracing::info!(tenant_id = %tenant_id, vendor_id = %vendor.id, payout_id = %payout.id, amount = %amount, "payout requested");
        Ok(payout)
    }

    pub fn payouts_for_vendor(&self, tenant_id: TenantId, vendor_id: VendorId) -> Result<Vec<Payout>, StoreError> {
        let mut payouts: Vec<Payout> = self
            .payouts
            .list(tenant_id)?
            .into_iter()
            .filter(|p| p.vendor_id == vendor_id)
            .collect();
        payouts.sort_by_key(|p| std::cmp::Reverse(p.requested_at));
        Ok(payouts)
    }

    pub fn list_payouts(&self, tenant_id: TenantId) -> Result<Vec<Payout>, StoreError> {
        let mut payouts = self.payouts.list(tenant_id)?;
        payouts.sort_by_key(|p| std::cmp::Reverse(p.requested_at));
        Ok(payouts)
    }

    pub fn decide_payout(
        &self,
        tenant_id: TenantId,
        payout_id: PayoutId,
        decision: PayoutDecision,
        now: DateTime<Utc>,
    ) -> Result<Payout, StoreError> {
        let _guard = self.ledger.lock().map_err(|_| StoreError::poisoned())?;
        let current = self
            .payouts
            .get(tenant_id, &payout_id)?
            .ok_or(DomainError::NotFound)?;

        // Balance changes go through the vendor record in place so a
        // concurrent status change is never overwritten.
        let mut decided = None;
        self.vendors.modify(tenant_id, &current.vendor_id, &mut |vendor| {
            let mut payout = current.clone();
            match &decision {
                PayoutDecision::Approve => payout.approve(now)?,
                PayoutDecision::Reject { note } => payout.reject(vendor, note.clone(), now)?,
                PayoutDecision::MarkPaid => payout.mark_paid(vendor, now)?,
            }
            decided = Some(payout);
            Ok(())
        })?;
        let payout = decided.ok_or_else(|| StoreError::backend("payout decision was not applied"))?;

        self.payouts.upsert(tenant_id, payout.id, payout.clone())?;
        tracing::info!(
            tenant_id = %tenant_id,
            payout_id = %payout_id,
            status = payout.status.as_str(),
            "payout status changed"
        );
        Ok(payout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_vendors::{PayoutStatus, VendorStatus};

    fn verified(svc: &VendorService, tenant: TenantId, owner: UserId) -> Vendor {
        let now = Utc::now();
        let v = svc.apply(tenant, owner, "Acme Goods", now).unwrap();
        svc.decide(tenant, v.id, VendorDecision::Verify, now).unwrap()
    }

    #[test]
    fn one_profile_per_owner() {
        let svc = VendorService::default();
        let (t, owner) = (TenantId::new(), UserId::new());
        svc.apply(t, owner, "A", Utc::now()).unwrap();
        let err = svc.apply(t, owner, "B", Utc::now()).unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::Conflict(_))));
        // Other tenants are independent.
        svc.apply(TenantId::new(), owner, "C", Utc::now()).unwrap();
    }

    #[test]
    fn reject_requires_reason_and_leaves_record_unchanged() {
        let svc = VendorService::default();
        let t = TenantId::new();
        let v = svc.apply(t, UserId::new(), "A", Utc::now()).unwrap();
        let err = svc
            .decide(t, v.id, VendorDecision::Reject { reason: "".into() }, Utc::now())
            .unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::Validation(_))));
        assert_eq!(svc.get(t, v.id).unwrap().status, VendorStatus::Pending);
    }

    #[test]
    fn payout_round_trip_through_admin_decisions() {
        let svc = VendorService::default();
        let (t, owner) = (TenantId::new(), UserId::new());
        let v = verified(&svc, t, owner);
        let now = Utc::now();

        svc.credit_sale(t, v.id, Money::from_cents(20_000), now).unwrap();
        assert_eq!(svc.get(t, v.id).unwrap().balance.available, Money::from_cents(18_000));

        let p = svc.request_payout(t, owner, Money::from_cents(8_000), now).unwrap();
        assert_eq!(svc.get(t, v.id).unwrap().balance.held, Money::from_cents(8_000));

        svc.decide_payout(t, p.id, PayoutDecision::Approve, now).unwrap();
        let paid = svc.decide_payout(t, p.id, PayoutDecision::MarkPaid, now).unwrap();
        assert_eq!(paid.status, PayoutStatus::Paid);

        let after = svc.get(t, v.id).unwrap();
        assert_eq!(after.balance.held, Money::ZERO);
        assert_eq!(after.balance.available, Money::from_cents(10_000));
        assert_eq!(svc.payouts_for_vendor(t, v.id).unwrap().len(), 1);
    }

    #[test]
    fn payout_decisions_keep_concurrent_status_changes() {
        let svc = VendorService::default();
        let (t, owner) = (TenantId::new(), UserId::new());
        let v = verified(&svc, t, owner);
        let now = Utc::now();
        svc.credit_sale(t, v.id, Money::from_cents(100_000), now).unwrap();
        let payouts: Vec<Payout> = (0..20)
            .map(|_| svc.request_payout(t, owner, Money::from_cents(1_000), now).unwrap())
            .collect();

        std::thread::scope(|s| {
            s.spawn(|| {
                for p in &payouts {
                    svc.decide_payout(t, p.id, PayoutDecision::Reject { note: None }, now).unwrap();
                }
            });
            s.spawn(|| {
                for i in 0..21 {
                    let decision = if i % 2 == 0 { VendorDecision::Suspend } else { VendorDecision::Reinstate };
                    svc.decide(t, v.id, decision, now).unwrap();
                }
            });
        });

        let after = svc.get(t, v.id).unwrap();
        assert_eq!(after.status, VendorStatus::Suspended);
        assert_eq!(after.balance.held, Money::ZERO);
        assert_eq!(after.balance.available, Money::from_cents(90_000));
    }

    #[test]
    fn rejected_payout_returns_funds() {
        let svc = VendorService::default();
        let (t, owner) = (TenantId::new(), UserId::new());
        let v = verified(&svc, t, owner);
        let now = Utc::now();
        svc.credit_sale(t, v.id, Money::from_cents(5_000), now).unwrap();

        let p = svc.request_payout(t, owner, Money::from_cents(4_500), now).unwrap();
        svc.decide_payout(t, p.id, PayoutDecision::Reject { note: Some("kyc".into()) }, now)
            .unwrap();
        assert_eq!(svc.get(t, v.id).unwrap().balance.available, Money::from_cents(4_500));

        let err = svc
            .request_payout(t, owner, Money::from_cents(4_501), now)
            .unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::Validation(_))));
    }
}

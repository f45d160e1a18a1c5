use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use bazaar_core::{TenantId, UserId};
use bazaar_exports::{SnapshotRecord, SnapshotSection, UserDataSnapshot};

use crate::error::StoreError;
use crate::loyalty::LoyaltyService;
use crate::orders::OrderService;
use crate::profiles::ProfileDirectory;
use crate::vendors::VendorService;

/// Collects everything held about a user into a snapshot.
pub trait UserDataSource: Send + Sync {
    fn snapshot(&self, tenant_id: TenantId, user_id: UserId, now: DateTime<Utc>) -> Result<UserDataSnapshot, StoreError>;
}

pub struct MarketplaceDataSource {
    profiles: Arc<ProfileDirectory>,
    loyalty: Arc<LoyaltyService>,
    orders: Arc<OrderService>,
    vendors: Arc<VendorService>,
}

impl MarketplaceDataSource {
    pub fn new(
        profiles: Arc<ProfileDirectory>,
        loyalty: Arc<LoyaltyService>,
        orders: Arc<OrderService>,
        vendors: Arc<VendorService>,
    ) -> Self {
        Self {
            profiles,
            loyalty,
            orders,
            vendors,
        }
    }
}

fn section<T: Serialize>(name: &str, items: &[T]) -> Result<SnapshotSection, StoreError> {
    SnapshotSection::from_items(name, items).map_err(|e| StoreError::backend(format!("serialising {name}: {e}")))
}

impl UserDataSource for MarketplaceDataSource {
    fn snapshot(&self, tenant_id: TenantId, user_id: UserId, now: DateTime<Utc>) -> Result<UserDataSnapshot, StoreError> {
        let profile = self.profiles.get(tenant_id, user_id, now)?;
        let account = self.loyalty.account(tenant_id, user_id, now)?;

        let loyalty = SnapshotRecord::new()
            .field("balance", account.balance)
            .field("lifetime_points", account.lifetime_points)
            .field("tier", account.tier.as_str())
            .field("points_to_next_tier", account.points_to_next_tier());

        let mut snapshot = UserDataSnapshot::new(tenant_id, user_id, now)
            .with_section(section("profile", &[profile])?)
            .with_section(SnapshotSection::new("loyalty_account", vec![loyalty]))
            .with_section(section("coupons", &self.loyalty.coupons(tenant_id, user_id)?)?)
            .with_section(section("game_plays", &self.loyalty.plays(tenant_id, user_id)?)?)
            .with_section(section("orders", &self.orders.list_for_buyer(tenant_id, user_id)?)?);

        if let Some(vendor) = self.vendors.for_owner(tenant_id, user_id)? {
            let payouts = self.vendors.payouts_for_vendor(tenant_id, vendor.id)?;
            snapshot = snapshot
                .with_section(section("vendor", &[vendor])?)
                .with_section(section("payouts", &payouts)?);
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loyalty::InMemoryLoyaltyRepository;
    use crate::profiles::ProfileUpdate;

    #[test]
    fn snapshot_contains_core_sections_and_vendor_when_present() {
        let profiles = Arc::new(ProfileDirectory::default());
        let loyalty = Arc::new(LoyaltyService::new(Arc::new(InMemoryLoyaltyRepository::new())));
        let vendors = Arc::new(VendorService::default());
        let orders = Arc::new(OrderService::new(loyalty.clone(), vendors.clone()));
        let source = MarketplaceDataSource::new(profiles.clone(), loyalty, orders, vendors.clone());

        let (t, u, now) = (TenantId::new(), UserId::new(), Utc::now());
        profiles
            .update(t, u, ProfileUpdate { email: Some("me@shop.test".into()), ..Default::default() }, now)
            .unwrap();

        let snap = source.snapshot(t, u, now).unwrap();
        for name in ["profile", "loyalty_account", "coupons", "game_plays", "orders"] {
            assert!(snap.section(name).is_some(), "missing section {name}");
        }
        assert!(snap.section("vendor").is_none());
        let email = snap.section("profile").unwrap().records[0]
            .fields
            .iter()
            .find(|(k, _)| k == "email")
            .map(|(_, v)| v.clone());
        assert_eq!(email, Some(serde_json::json!("me@shop.test")));

        vendors.apply(t, u, "My Shop", now).unwrap();
        let snap = source.snapshot(t, u, now).unwrap();
        assert_eq!(snap.section("vendor").unwrap().records.len(), 1);
    }
}

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use bazaar_core::{DomainError, TenantId, UserId};
use bazaar_loyalty::{Coupon, GamePlay, LoyaltyAccount, LoyaltyCommit};

use crate::error::StoreError;

/// Storage for loyalty accounts, plays and coupons.
pub trait LoyaltyRepository: Send + Sync {
    fn account(&self, tenant_id: TenantId, user_id: UserId) -> Result<Option<LoyaltyAccount>, StoreError>;

    fn plays(&self, tenant_id: TenantId, user_id: UserId) -> Result<Vec<GamePlay>, StoreError>;

    fn coupons(&self, tenant_id: TenantId, user_id: UserId) -> Result<Vec<Coupon>, StoreError>;

    fn coupon_by_code(&self, tenant_id: TenantId, code: &str) -> Result<Option<Coupon>, StoreError>;

    /// Mark a coupon used by `user_id`, atomically with the lookup.
    fn consume_coupon(
        &self,
        tenant_id: TenantId,
        code: &str,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Coupon, StoreError>;

    /// Apply a commit all-or-nothing.
    ///
    /// Fails with `StoreError::Concurrency` when the stored account is not at
    /// `commit.expected_version` or the coupon code is already taken.
    fn commit(&self, commit: LoyaltyCommit) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
struct LoyaltyState {
    accounts: HashMap<(TenantId, UserId), LoyaltyAccount>,
    plays: Vec<GamePlay>,
    coupons: HashMap<(TenantId, String), Coupon>,
}

/// In-memory loyalty repository; one lock covers all three tables.
#[derive(Debug, Default)]
pub struct InMemoryLoyaltyRepository {
    state: RwLock<LoyaltyState>,
}

impl InMemoryLoyaltyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoyaltyRepository for InMemoryLoyaltyRepository {
    fn account(&self, tenant_id: TenantId, user_id: UserId) -> Result<Option<LoyaltyAccount>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::poisoned())?;
        Ok(state.accounts.get(&(tenant_id, user_id)).cloned())
    }

    fn plays(&self, tenant_id: TenantId, user_id: UserId) -> Result<Vec<GamePlay>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::poisoned())?;
        Ok(state
            .plays
            .iter()
            .filter(|p| p.tenant_id == tenant_id && p.user_id == user_id)
            .cloned()
            .collect())
    }

    fn coupons(&self, tenant_id: TenantId, user_id: UserId) -> Result<Vec<Coupon>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::poisoned())?;
        let mut coupons: Vec<Coupon> = state
            .coupons
            .values()
            .filter(|c| c.tenant_id == tenant_id && c.user_id == user_id)
            .cloned()
            .collect();
        coupons.sort_by_key(|c| std::cmp::Reverse(c.issued_at));
        Ok(coupons)
    }

    fn coupon_by_code(&self, tenant_id: TenantId, code: &str) -> Result<Option<Coupon>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::poisoned())?;
        Ok(state.coupons.get(&(tenant_id, code.to_string())).cloned())
    }

    fn consume_coupon(
        &self,
        tenant_id: TenantId,
        code: &str,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Coupon, StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::poisoned())?;
        let coupon = state
            .coupons
            .get_mut(&(tenant_id, code.to_string()))
            .ok_or(DomainError::NotFound)?;
        coupon.consume(user_id, now)?;
        Ok(coupon.clone())
    }

    fn commit(&self, commit: LoyaltyCommit) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::poisoned())?;
        let key = (commit.account.tenant_id, commit.account.user_id);

        let current = state.accounts.get(&key).map(|a| a.version).unwrap_or(0);
        commit
            .expected_version
            .check(current)
            .map_err(|e| StoreError::Concurrency(e.to_string()))?;

        if let Some(coupon) = &commit.coupon {
            if state.coupons.contains_key(&(coupon.tenant_id, coupon.code.clone())) {
                return Err(StoreError::Concurrency(format!("coupon code {} already issued", coupon.code)));
            }
        }

        // All checks passed; nothing below can fail.
        state.accounts.insert(key, commit.account);
        if let Some(play) = commit.play {
            state.plays.push(play);
        }
        if let Some(coupon) = commit.coupon {
            state.coupons.insert((coupon.tenant_id, coupon.code.clone()), coupon);
        }
        Ok(())
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, DomainResult, TenantId, UserId, Versioned};

use crate::tier::Tier;

/// Points balance for one user in one tenant.
///
/// `lifetime_points` only grows, so spending points never lowers the tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyAccount {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub balance: u64,
    pub lifetime_points: u64,
    pub tier: Tier,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

impl LoyaltyAccount {
    /// A not-yet-persisted account (version 0).
    pub fn open(tenant_id: TenantId, user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            tenant_id,
            user_id,
            balance: 0,
            lifetime_points: 0,
            tier: Tier::Bronze,
            version: 0,
            updated_at: now,
        }
    }

    pub fn credit(&mut self, points: u64, now: DateTime<Utc>) {
        self.balance = self.balance.saturating_add(points);
        self.lifetime_points = self.lifetime_points.saturating_add(points);
        self.tier = Tier::for_lifetime_points(self.lifetime_points);
        self.updated_at = now;
    }

    pub fn debit(&mut self, points: u64, now: DateTime<Utc>) -> DomainResult<()> {
        if points > self.balance {
            return Err(DomainError::validation(format!(
                "insufficient points: balance {}, requested {}",
                self.balance, points
            )));
        }
        self.balance -= points;
        self.updated_at = now;
        Ok(())
    }

    /// Points still needed to reach the next tier.
    pub fn points_to_next_tier(&self) -> Option<u64> {
        self.tier
            .next_threshold()
            .map(|t| t.saturating_sub(self.lifetime_points))
    }
}

impl Versioned for LoyaltyAccount {
    fn version(&self) -> u64 {
        self.version
    }
}

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use bazaar_core::{CouponId, DomainError, DomainResult, Money, TenantId, UserId};

const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 8;

/// Days a coupon stays valid after issue.
pub const COUPON_TTL_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CouponKind {
    PercentOff { percent: u8 },
    AmountOff { amount: Money },
    FreeShipping,
}

/// Single-use coupon owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: CouponId,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub code: String,
    pub kind: CouponKind,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl Coupon {
    pub fn issue(
        tenant_id: TenantId,
        user_id: UserId,
        code: String,
        kind: CouponKind,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CouponId::new(),
            tenant_id,
            user_id,
            code,
            kind,
            issued_at: now,
            expires_at: now + Duration::days(COUPON_TTL_DAYS),
            used_at: None,
        }
    }

    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && now < self.expires_at
    }

    /// Consume the coupon for `user_id`.
    pub fn consume(&mut self, user_id: UserId, now: DateTime<Utc>) -> DomainResult<()> {
        if self.user_id != user_id {
            return Err(DomainError::NotFound);
        }
        if self.used_at.is_some() {
            return Err(DomainError::invariant("coupon already used"));
        }
        if now >= self.expires_at {
            return Err(DomainError::invariant("coupon expired"));
        }
        self.used_at = Some(now);
        Ok(())
    }
}

/// `BZR-` followed by 8 characters from an alphabet without look-alikes.
pub fn generate_coupon_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    let suffix: String = (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    format!("BZR-{suffix}")
}

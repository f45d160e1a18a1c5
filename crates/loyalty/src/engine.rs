//! Planning functions: current state in, one atomic commit out.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use bazaar_core::{DomainError, DomainResult, ExpectedVersion, Money};

use crate::account::LoyaltyAccount;
use crate::coupon::{Coupon, CouponKind};
use crate::game::{DAILY_PLAY_LIMIT, GameKind, GamePlay};
use crate::reward::Reward;
use crate::tier::points_for_order;

/// Redemptions must be whole multiples of this many points.
pub const REDEMPTION_STEP: u64 = 100;

/// Everything one loyalty operation writes.
///
/// A repository applies all of it or none of it, and only if the stored
/// account is still at `expected_version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoyaltyCommit {
    pub account: LoyaltyAccount,
    pub expected_version: ExpectedVersion,
    pub play: Option<GamePlay>,
    pub coupon: Option<Coupon>,
}

impl LoyaltyCommit {
    fn from_account(before: &LoyaltyAccount, mut after: LoyaltyAccount) -> Self {
        after.version = before.version + 1;
        Self {
            account: after,
            expected_version: ExpectedVersion::Exact(before.version),
            play: None,
            coupon: None,
        }
    }
}

/// Plan a game play with an already drawn reward.
///
/// `coupon_code` is only used when the reward issues a coupon.
pub fn plan_play(
    account: &LoyaltyAccount,
    game: GameKind,
    plays_today: u32,
    reward: Reward,
    coupon_code: String,
    now: DateTime<Utc>,
) -> DomainResult<LoyaltyCommit> {
    if plays_today >= DAILY_PLAY_LIMIT {
        return Err(DomainError::conflict(format!(
            "daily limit of {DAILY_PLAY_LIMIT} plays reached for {}",
            game.slug()
        )));
    }

    let mut after = account.clone();
    after.updated_at = now;

    let coupon_kind = match reward {
        Reward::Points { points } => {
            after.credit(points, now);
            None
        }
        Reward::PercentOff { percent } => Some(CouponKind::PercentOff { percent }),
        Reward::FreeShipping => Some(CouponKind::FreeShipping),
        Reward::Nothing => None,
    };

    let mut commit = LoyaltyCommit::from_account(account, after);
    commit.coupon = coupon_kind
        .map(|kind| Coupon::issue(account.tenant_id, account.user_id, coupon_code, kind, now));
    commit.play = Some(GamePlay {
        id: Uuid::now_v7(),
        tenant_id: account.tenant_id,
        user_id: account.user_id,
        game,
        reward,
        played_at: now,
    });
    Ok(commit)
}

/// Plan a points-for-coupon redemption (1 point = 1 cent).
pub fn plan_redemption(
    account: &LoyaltyAccount,
    points: u64,
    coupon_code: String,
    now: DateTime<Utc>,
) -> DomainResult<LoyaltyCommit> {
    if points == 0 || points % REDEMPTION_STEP != 0 {
        return Err(DomainError::validation(format!(
            "points must be a positive multiple of {REDEMPTION_STEP}"
        )));
    }

    let mut after = account.clone();
    after.debit(points, now)?;

    let mut commit = LoyaltyCommit::from_account(account, after);
    commit.coupon = Some(Coupon::issue(
        account.tenant_id,
        account.user_id,
        coupon_code,
        CouponKind::AmountOff {
            amount: Money::from_cents(points),
        },
        now,
    ));
    Ok(commit)
}

/// Plan the points award for a delivered order. Returns the commit and the
/// number of points earned (which may be zero).
pub fn plan_order_award(
    account: &LoyaltyAccount,
    order_total: Money,
    now: DateTime<Utc>,
) -> (LoyaltyCommit, u64) {
    let points = points_for_order(order_total, account.tier);
    let mut after = account.clone();
    after.credit(points, now);
    (LoyaltyCommit::from_account(account, after), points)
}

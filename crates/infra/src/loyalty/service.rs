use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use bazaar_core::{DomainError, Money, TenantId, UserId};
use bazaar_loyalty::{
    Coupon, DAILY_PLAY_LIMIT, GameKind, GamePlay, LoyaltyAccount, LoyaltyCommit, Reward, RewardTable,
    generate_coupon_code, plan_order_award, plan_play, plan_redemption,
};

use super::repository::LoyaltyRepository;
use crate::error::StoreError;

const MAX_COMMIT_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct GameAvailability {
    pub game: GameKind,
    pub title: &'static str,
    pub plays_today: u32,
    pub plays_left: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayOutcome {
    pub game: GameKind,
    pub reward: Reward,
    pub label: String,
    pub coupon: Option<Coupon>,
    pub account: LoyaltyAccount,
    pub plays_left: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Redemption {
    pub coupon: Coupon,
    pub account: LoyaltyAccount,
}

/// Games, redemptions and order awards over a [`LoyaltyRepository`].
///
/// Every write is planned from a fresh read and committed with an exact
/// version expectation; conflicting writers are retried a bounded number of
/// times.
pub struct LoyaltyService {
    repo: Arc<dyn LoyaltyRepository>,
    rewards: RewardTable,
    rng: Mutex<StdRng>,
}

impl LoyaltyService {
    pub fn new(repo: Arc<dyn LoyaltyRepository>) -> Self {
        Self {
            repo,
            rewards: RewardTable::default(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn with_rewards(mut self, rewards: RewardTable) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn rewards(&self) -> &RewardTable {
        &self.rewards
    }

    pub fn account(&self, tenant_id: TenantId, user_id: UserId, now: DateTime<Utc>) -> Result<LoyaltyAccount, StoreError> {
        Ok(self
            .repo
            .account(tenant_id, user_id)?
            .unwrap_or_else(|| LoyaltyAccount::open(tenant_id, user_id, now)))
    }

    pub fn plays(&self, tenant_id: TenantId, user_id: UserId) -> Result<Vec<GamePlay>, StoreError> {
        self.repo.plays(tenant_id, user_id)
    }

    pub fn coupons(&self, tenant_id: TenantId, user_id: UserId) -> Result<Vec<Coupon>, StoreError> {
        self.repo.coupons(tenant_id, user_id)
    }

    fn plays_today(&self, tenant_id: TenantId, user_id: UserId, game: GameKind, now: DateTime<Utc>) -> Result<u32, StoreError> {
        let today = now.date_naive();
        let count = self
            .repo
            .plays(tenant_id, user_id)?
            .iter()
            .filter(|p| p.game == game && p.played_at.date_naive() == today)
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    pub fn games(&self, tenant_id: TenantId, user_id: UserId, now: DateTime<Utc>) -> Result<Vec<GameAvailability>, StoreError> {
        GameKind::ALL
            .iter()
            .map(|&game| {
                let plays_today = self.plays_today(tenant_id, user_id, game, now)?;
                Ok(GameAvailability {
                    game,
                    title: game.title(),
                    plays_today,
                    plays_left: DAILY_PLAY_LIMIT.saturating_sub(plays_today),
                })
            })
            .collect()
    }

    fn coupon_code(&self) -> Result<String, StoreError> {
        let mut rng = self.rng.lock().map_err(|_| StoreError::poisoned())?;
        Ok(generate_coupon_code(&mut *rng))
    }

    fn commit_with_retry<T>(
        &self,
        op: &'static str,
        mut attempt: impl FnMut() -> Result<(LoyaltyCommit, T), StoreError>,
    ) -> Result<T, StoreError> {
        let mut last_conflict = None;
        for n in 1..=MAX_COMMIT_ATTEMPTS {
            let (commit, out) = attempt()?;
            match self.repo.commit(commit) {
                Ok(()) => return Ok(out),
                Err(StoreError::Concurrency(msg)) => {
                    tracing::debug!(op, attempt = n, reason = %msg, "loyalty commit conflicted; retrying");
                    last_conflict = Some(msg);
                }
                Err(e) => return Err(e),
            }
        }
        tracing::warn!(op, "loyalty commit gave up after {MAX_COMMIT_ATTEMPTS} attempts");
        Err(StoreError::Concurrency(
            last_conflict.unwrap_or_else(|| "too many concurrent updates".to_string()),
        ))
    }

    /// Play `game` once: draw a reward and commit the play with its payout.
    pub fn play(&self, tenant_id: TenantId, user_id: UserId, game: GameKind, now: DateTime<Utc>) -> Result<PlayOutcome, StoreError> {
        let reward = {
            let mut rng = self.rng.lock().map_err(|_| StoreError::poisoned())?;
            self.rewards.draw(&mut *rng)?
        };

        let outcome = self.commit_with_retry("play", || {
            let account = self.account(tenant_id, user_id, now)?;
            let plays_today = self.plays_today(tenant_id, user_id, game, now)?;
            let commit = plan_play(&account, game, plays_today, reward, self.coupon_code()?, now)?;
            let outcome = PlayOutcome {
                game,
                reward,
                label: reward.label(),
                coupon: commit.coupon.clone(),
                account: commit.account.clone(),
                plays_left: DAILY_PLAY_LIMIT.saturating_sub(plays_today + 1),
            };
            Ok((commit, outcome))
        })?;

        tracing::info!(
            tenant_id = %tenant_id,
            user_id = %user_id,
            game = game.slug(),
            reward = %outcome.label,
            "game played"
        );
        Ok(outcome)
    }

    /// Exchange points for a fixed-amount coupon.
    pub fn redeem(&self, tenant_id: TenantId, user_id: UserId, points: u64, now: DateTime<Utc>) -> Result<Redemption, StoreError> {
        let redemption = self.commit_with_retry("redeem", || {
            let account = self.account(tenant_id, user_id, now)?;
            let commit = plan_redemption(&account, points, self.coupon_code()?, now)?;
            let coupon = commit
                .coupon
                .clone()
                .ok_or_else(|| DomainError::invariant("redemption produced no coupon"))?;
            let out = Redemption {
                coupon,
                account: commit.account.clone(),
            };
            Ok((commit, out))
        })?;

        tracing::info!(tenant_id = %tenant_id, user_id = %user_id, points, code = %redemption.coupon.code, "points redeemed");
        Ok(redemption)
    }

    /// Credit points for a delivered order. Returns the points earned.
    pub fn award_order(&self, tenant_id: TenantId, user_id: UserId, order_total: Money, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let points = self.commit_with_retry("order_award", || {
            let account = self.account(tenant_id, user_id, now)?;
            Ok(plan_order_award(&account, order_total, now))
        })?;
        tracing::info!(tenant_id = %tenant_id, user_id = %user_id, points, "order points awarded");
        Ok(points)
    }

    /// A coupon `user_id` may apply right now.
    pub fn usable_coupon(&self, tenant_id: TenantId, user_id: UserId, code: &str, now: DateTime<Utc>) -> Result<Coupon, StoreError> {
        match self.repo.coupon_by_code(tenant_id, code)? {
            Some(c) if c.user_id == user_id && c.is_usable(now) => Ok(c),
            _ => Err(DomainError::validation(format!("coupon {code} is not valid")).into()),
        }
    }

    pub fn consume_coupon(&self, tenant_id: TenantId, user_id: UserId, code: &str, now: DateTime<Utc>) -> Result<Coupon, StoreError> {
        self.repo.consume_coupon(tenant_id, code, user_id, now)
    }
}

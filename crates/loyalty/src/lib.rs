//! Gamification and loyalty domain module.
//!
//! Pure rules only: tier thresholds, the reward table and its weighted draw,
//! coupons, and the planning functions that turn a play, a redemption or a
//! delivered order into a [`LoyaltyCommit`]. Persisting a commit atomically is
//! the repository's job (`bazaar-infra`).

pub mod account;
pub mod coupon;
pub mod engine;
pub mod game;
pub mod reward;
pub mod tier;

pub use account::LoyaltyAccount;
pub use coupon::{Coupon, CouponKind, generate_coupon_code};
pub use engine::{LoyaltyCommit, REDEMPTION_STEP, plan_order_award, plan_play, plan_redemption};
pub use game::{DAILY_PLAY_LIMIT, GameKind, GamePlay};
pub use reward::{Reward, RewardEntry, RewardTable};
pub use tier::{Tier, points_for_order};

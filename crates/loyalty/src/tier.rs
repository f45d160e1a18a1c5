use serde::{Deserialize, Serialize};

use bazaar_core::Money;

/// Loyalty tier derived from lifetime points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Tier {
    pub const SILVER_THRESHOLD: u64 = 1_000;
    pub const GOLD_THRESHOLD: u64 = 5_000;
    pub const PLATINUM_THRESHOLD: u64 = 10_000;

    pub fn for_lifetime_points(points: u64) -> Self {
        if points >= Self::PLATINUM_THRESHOLD {
            Tier::Platinum
        } else if points >= Self::GOLD_THRESHOLD {
            Tier::Gold
        } else if points >= Self::SILVER_THRESHOLD {
            Tier::Silver
        } else {
            Tier::Bronze
        }
    }

    /// Earning multiplier in percent (bronze earns at 100%).
    pub fn multiplier_percent(self) -> u64 {
        match self {
            Tier::Bronze => 100,
            Tier::Silver => 125,
            Tier::Gold => 150,
            Tier::Platinum => 200,
        }
    }

    /// Lifetime points needed to reach the next tier, if any.
    pub fn next_threshold(self) -> Option<u64> {
        match self {
            Tier::Bronze => Some(Self::SILVER_THRESHOLD),
            Tier::Silver => Some(Self::GOLD_THRESHOLD),
            Tier::Gold => Some(Self::PLATINUM_THRESHOLD),
            Tier::Platinum => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Platinum => "platinum",
        }
    }
}

/// Points earned for an order: one point per currency unit, scaled by the
/// tier multiplier. Only the final product is rounded down.
pub fn points_for_order(total: Money, tier: Tier) -> u64 {
    let scaled = u128::from(total.cents()) * u128::from(tier.multiplier_percent());
    (scaled / 10_000) as u64
}

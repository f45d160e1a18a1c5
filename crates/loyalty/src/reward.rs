use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, DomainResult};

/// A prize a game can hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reward {
    Points { points: u64 },
    PercentOff { percent: u8 },
    FreeShipping,
    Nothing,
}

impl Reward {
    pub fn label(&self) -> String {
        match self {
            Reward::Points { points } => format!("{points} bonus points"),
            Reward::PercentOff { percent } => format!("{percent}% off your next order"),
            Reward::FreeShipping => "Free shipping".to_string(),
            Reward::Nothing => "Better luck next time".to_string(),
        }
    }

    /// Whether winning this reward issues a coupon.
    pub fn issues_coupon(&self) -> bool {
        matches!(self, Reward::PercentOff { .. } | Reward::FreeShipping)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RewardEntry {
    pub reward: Reward,
    pub weight: u32,
}

/// Weighted prize table shared by all games.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardTable {
    entries: Vec<RewardEntry>,
}

impl Default for RewardTable {
    fn default() -> Self {
        Self::new(vec![
            RewardEntry { reward: Reward::Points { points: 10 }, weight: 30 },
            RewardEntry { reward: Reward::Points { points: 25 }, weight: 20 },
            RewardEntry { reward: Reward::Points { points: 100 }, weight: 8 },
            RewardEntry { reward: Reward::PercentOff { percent: 5 }, weight: 15 },
            RewardEntry { reward: Reward::PercentOff { percent: 10 }, weight: 7 },
            RewardEntry { reward: Reward::FreeShipping, weight: 10 },
            RewardEntry { reward: Reward::Nothing, weight: 10 },
        ])
    }
}

impl RewardTable {
    pub fn new(entries: Vec<RewardEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[RewardEntry] {
        &self.entries
    }

    pub fn total_weight(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.weight)).sum()
    }

    /// Draw one reward with probability proportional to its weight.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> DomainResult<Reward> {
        let index = WeightedIndex::new(self.entries.iter().map(|e| e.weight))
            .map_err(|e| DomainError::invariant(format!("reward table cannot be drawn from: {e}")))?;
        Ok(self.entries[index.sample(rng)].reward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    #[test]
    fn default_table_weights_sum_to_100() {
        assert_eq!(RewardTable::default().total_weight(), 100);
    }

    #[test]
    fn only_discount_prizes_issue_coupons() {
        assert!(Reward::PercentOff { percent: 5 }.issues_coupon());
        assert!(Reward::FreeShipping.issues_coupon());
        assert!(!Reward::Points { points: 10 }.issues_coupon());
        assert!(!Reward::Nothing.issues_coupon());
    }

    #[test]
    fn draw_is_deterministic_for_a_seed() {
        let table = RewardTable::default();
        let a: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(7);
            (0..20).map(|_| table.draw(&mut rng).unwrap()).collect()
        };
        let b: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(7);
            (0..20).map(|_| table.draw(&mut rng).unwrap()).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn zero_weight_entries_are_never_drawn() {
        let table = RewardTable::new(vec![
            RewardEntry { reward: Reward::Nothing, weight: 0 },
            RewardEntry { reward: Reward::FreeShipping, weight: 1 },
        ]);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            assert_eq!(table.draw(&mut rng).unwrap(), Reward::FreeShipping);
        }
    }

    #[test]
    fn empty_or_zero_table_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(RewardTable::new(vec![]).draw(&mut rng).is_err());
        let zero = RewardTable::new(vec![RewardEntry { reward: Reward::Nothing, weight: 0 }]);
        assert!(matches!(zero.draw(&mut rng), Err(DomainError::InvariantViolation(_))));
    }

    #[test]
    fn frequencies_follow_weights() {
        let table = RewardTable::default();
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen: HashMap<Reward, u32> = HashMap::new();
        for _ in 0..20_000 {
            *seen.entry(table.draw(&mut rng).unwrap()).or_default() += 1;
        }
        // 30% weight: expect ~6000, allow generous slack.
        let ten = seen[&Reward::Points { points: 10 }];
        assert!((5_400..6_600).contains(&ten), "got {ten}");
    }
}

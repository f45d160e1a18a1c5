use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_core::{DomainError, DomainResult, TenantId, UserId};

use crate::reward::Reward;

/// Maximum plays per user, per game, per UTC day.
pub const DAILY_PLAY_LIMIT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameKind {
    SpinWheel,
    ScratchCard,
}

impl GameKind {
    pub const ALL: [GameKind; 2] = [GameKind::SpinWheel, GameKind::ScratchCard];

    pub fn slug(self) -> &'static str {
        match self {
            GameKind::SpinWheel => "spin-wheel",
            GameKind::ScratchCard => "scratch-card",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            GameKind::SpinWheel => "Spin the Wheel",
            GameKind::ScratchCard => "Scratch Card",
        }
    }

    pub fn from_slug(slug: &str) -> DomainResult<Self> {
        Self::ALL
            .into_iter()
            .find(|g| g.slug() == slug)
            .ok_or_else(|| DomainError::validation(format!("unknown game '{slug}'")))
    }
}

/// One recorded play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamePlay {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub game: GameKind,
    pub reward: Reward,
    pub played_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_round_trip() {
        for g in GameKind::ALL {
            assert_eq!(GameKind::from_slug(g.slug()).unwrap(), g);
        }
        assert!(GameKind::from_slug("roulette").is_err());
    }
}

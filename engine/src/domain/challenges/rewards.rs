//! Placement rewards.

use serde::{Deserialize, Serialize};

use crate::domain::UserId;

use super::LeaderboardEntry;

/// What one finishing position earns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceReward {
    #[serde(default)]
    pub xp: u64,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Rewards by final rank; everyone below third earns `participation`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardTable {
    #[serde(default)]
    pub first: PlaceReward,
    #[serde(default)]
    pub second: PlaceReward,
    #[serde(default)]
    pub third: PlaceReward,
    #[serde(default)]
    pub participation: PlaceReward,
}

/// Reward owed to one participant of a completed challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardGrant {
    pub user_id: UserId,
    pub rank: u32,
    pub xp: u64,
    pub badge: Option<String>,
    pub title: Option<String>,
}

impl RewardTable {
    /// Tier matching a 1-based rank.
    pub fn for_rank(&self, rank: u32) -> &PlaceReward {
        match rank {
            1 => &self.first,
            2 => &self.second,
            3 => &self.third,
            _ => &self.participation,
        }
    }

    /// One grant per leaderboard row, in rank order.
    pub fn distribute(&self, leaderboard: &[LeaderboardEntry]) -> Vec<RewardGrant> {
        leaderboard
            .iter()
            .map(|entry| {
                let tier = self.for_rank(entry.rank);
                RewardGrant {
                    user_id: entry.user_id.clone(),
                    rank: entry.rank,
                    xp: tier.xp,
                    badge: tier.badge.clone(),
                    title: tier.title.clone(),
                }
            })
            .collect()
    }
}

//! Achievement catalog entries.

use serde::{Deserialize, Serialize};

use crate::domain::AchievementId;
use crate::domain::progress::StatField;

use super::Condition;

/// Rarity tier scaling an achievement's base XP reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// Reward multiplier expressed in tenths (1.5 is 15).
    pub const fn multiplier_tenths(self) -> u64 {
        match self {
            Self::Common => 10,
            Self::Uncommon => 15,
            Self::Rare => 20,
            Self::Epic => 30,
            Self::Legendary => 50,
        }
    }
}

/// Rounding applied when a rarity multiplier leaves half an XP point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardRounding {
    /// Round halves up (away from zero for non-negative XP).
    #[default]
    HalfAwayFromZero,
    /// Banker's rounding: halves go to the even neighbour.
    HalfEven,
}

impl RewardRounding {
    /// Parse a configuration value such as `half_even`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "half_away_from_zero" | "standard" => Some(Self::HalfAwayFromZero),
            "half_even" | "bankers" => Some(Self::HalfEven),
            _ => None,
        }
    }
}

/// Rarity-scaled XP for a base reward, computed exactly in integers.
///
/// # Examples
/// ```
/// use practice_engine::domain::achievements::{Rarity, RewardRounding, scaled_reward_xp};
///
/// assert_eq!(scaled_reward_xp(100, Rarity::Legendary, RewardRounding::HalfAwayFromZero), 500);
/// assert_eq!(scaled_reward_xp(43, Rarity::Uncommon, RewardRounding::HalfAwayFromZero), 65);
/// assert_eq!(scaled_reward_xp(43, Rarity::Uncommon, RewardRounding::HalfEven), 64);
/// ```
pub fn scaled_reward_xp(base_xp: u64, rarity: Rarity, rounding: RewardRounding) -> u64 {
    let tenths = base_xp.saturating_mul(rarity.multiplier_tenths());
    let whole = tenths / 10;
    let remainder = tenths % 10;
    let round_up = match remainder {
        0..=4 => false,
        5 => match rounding {
            RewardRounding::HalfAwayFromZero => true,
            RewardRounding::HalfEven => whole % 2 == 1,
        },
        _ => true,
    };
    if round_up {
        whole.saturating_add(1)
    } else {
        whole
    }
}

/// What unlocking an achievement grants before rarity scaling.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementReward {
    pub xp: u64,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Requirement tag selecting which statistic a threshold applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    TotalPracticeTime,
    ConsecutiveDays,
    TotalSessions,
    SkillLevel,
    StreakLength,
    XpThreshold,
    /// Qualifies purely through its conditions.
    CustomGoal,
}

impl RequirementKind {
    /// Statistic compared against the threshold; `None` for custom goals.
    pub const fn stat_field(self) -> Option<StatField> {
        match self {
            Self::TotalPracticeTime => Some(StatField::TotalPracticeMinutes),
            Self::ConsecutiveDays => Some(StatField::CurrentStreak),
            Self::TotalSessions => Some(StatField::TotalSessions),
            Self::SkillLevel => Some(StatField::Level),
            Self::StreakLength => Some(StatField::LongestStreak),
            Self::XpThreshold => Some(StatField::TotalXp),
            Self::CustomGoal => None,
        }
    }
}

/// Threshold plus optional extra conditions, all of which must hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    pub kind: RequirementKind,
    #[serde(default)]
    pub threshold: u64,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Read-only catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementDefinition {
    pub id: AchievementId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub requirement: Requirement,
    pub reward: AchievementReward,
    pub rarity: Rarity,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub is_repeatable: bool,
}

const fn default_true() -> bool {
    true
}

impl AchievementDefinition {
    /// Reward XP after applying the rarity multiplier.
    pub fn reward_xp(&self, rounding: RewardRounding) -> u64 {
        scaled_reward_xp(self.reward.xp, self.rarity, rounding)
    }
}

//! Achievement catalog types and the qualification engine.

mod condition;
mod definition;
mod engine;
mod unlock;

pub use condition::{Condition, ConditionOperator, ConditionValue};
pub use definition::{
    AchievementDefinition, AchievementReward, Rarity, Requirement, RequirementKind,
    RewardRounding, scaled_reward_xp,
};
pub use engine::{AchievementEngine, UnlockDecision};
pub use unlock::AchievementUnlock;

//! Unlock facts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AchievementId, SessionId, UserId};

/// Immutable record that a user unlocked an achievement.
///
/// Non-repeatable achievements produce one record per user. Repeatable ones
/// produce at most one per completed session, identified by `session_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementUnlock {
    pub user_id: UserId,
    pub achievement_id: AchievementId,
    pub xp_awarded: u64,
    pub unlocked_at: DateTime<Utc>,
    /// Session whose completion produced the unlock.
    pub session_id: SessionId,
    pub repeatable: bool,
}

impl AchievementUnlock {
    /// Whether `other` records the same unlock occurrence.
    pub fn same_occurrence(&self, other: &Self) -> bool {
        self.user_id == other.user_id
            && self.achievement_id == other.achievement_id
            && (!self.repeatable || self.session_id == other.session_id)
    }
}

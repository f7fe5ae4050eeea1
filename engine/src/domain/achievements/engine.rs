//! Achievement qualification.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::AchievementId;
use crate::domain::progress::{StatSnapshot, StatValue};

use super::{AchievementDefinition, RewardRounding};

/// An achievement the snapshot qualifies for, with its scaled reward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockDecision {
    pub achievement_id: AchievementId,
    pub xp_awarded: u64,
    pub badge: Option<String>,
    pub title: Option<String>,
    pub repeatable: bool,
}

/// Evaluates catalog definitions against a snapshot.
///
/// The engine never mutates statistics; the caller applies `xp_awarded` and
/// records the unlocked identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AchievementEngine {
    rounding: RewardRounding,
}

impl AchievementEngine {
    pub fn new(rounding: RewardRounding) -> Self {
        Self { rounding }
    }

    /// Decide which definitions unlock for `stats`.
    ///
    /// Inactive definitions are ignored, as is every definition already in
    /// `already_unlocked` unless it is repeatable. Duplicate catalog ids are
    /// evaluated once, first entry wins. Decisions follow catalog order.
    pub fn evaluate(
        &self,
        stats: &StatSnapshot,
        catalog: &[AchievementDefinition],
        already_unlocked: &BTreeSet<AchievementId>,
    ) -> Vec<UnlockDecision> {
        let mut seen = BTreeSet::new();
        let mut decisions = Vec::new();
        for definition in catalog {
            if !seen.insert(&definition.id) || !definition.is_active {
                continue;
            }
            if !definition.is_repeatable && already_unlocked.contains(&definition.id) {
                continue;
            }
            if !qualifies(stats, definition) {
                continue;
            }
            decisions.push(UnlockDecision {
                achievement_id: definition.id.clone(),
                xp_awarded: definition.reward_xp(self.rounding),
                badge: definition.reward.badge.clone(),
                title: definition.reward.title.clone(),
                repeatable: definition.is_repeatable,
            });
        }
        decisions
    }
}

fn qualifies(stats: &StatSnapshot, definition: &AchievementDefinition) -> bool {
    let requirement = &definition.requirement;
    let threshold_met = match requirement.kind.stat_field() {
        Some(field) => match stats.stat(field) {
            StatValue::Number(value) => value >= requirement.threshold,
            StatValue::Achievements(_) | StatValue::Labels(_) => false,
        },
        // Custom goals qualify through their conditions alone.
        None => !requirement.conditions.is_empty(),
    };

    threshold_met
        && requirement
            .conditions
            .iter()
            .all(|condition| condition.holds(stats))
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;

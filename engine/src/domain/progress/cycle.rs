//! Applying one completed session to a snapshot.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::achievements::{AchievementDefinition, AchievementEngine, AchievementUnlock};
use crate::domain::sessions::SessionOutcome;
use crate::domain::{AchievementId, SessionId};

use super::{ProgressPolicy, StatSnapshot};

/// Everything one session completion changed on a snapshot.
///
/// Cycles are stored on the snapshot itself so a retried completion can
/// re-drive unlock recording and challenge updates without recomputing or
/// double-counting anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressCycle {
    pub session_id: SessionId,
    pub practice_date: NaiveDate,
    pub ended_at: DateTime<Utc>,
    /// Minutes the session contributed.
    pub minutes: u32,
    /// XP from the session itself.
    pub session_xp: u64,
    /// Total XP gained, session plus achievement rewards.
    pub xp_gained: u64,
    pub previous_level: u32,
    pub new_level: u32,
    pub new_streak: u32,
    pub unlocks: Vec<AchievementUnlock>,
    /// `false` when the achievement catalog was unavailable.
    pub achievements_evaluated: bool,
    /// Set once the session was deleted and its minutes subtracted.
    #[serde(default)]
    pub reversed: bool,
    /// The owning session has not acknowledged this cycle yet. Pending
    /// cycles are never evicted from the snapshot.
    #[serde(default)]
    pub pending: bool,
}

impl ProgressCycle {
    /// Marker for a session reversed after its completion cycle was
    /// evicted. It carries no XP or unlocks.
    pub(crate) fn reversal(
        outcome: &SessionOutcome,
        practice_date: NaiveDate,
        level: u32,
        streak: u32,
    ) -> Self {
        Self {
            session_id: outcome.session_id,
            practice_date,
            ended_at: outcome.ended_at,
            minutes: outcome.duration_minutes,
            session_xp: 0,
            xp_gained: 0,
            previous_level: level,
            new_level: level,
            new_streak: streak,
            unlocks: Vec::new(),
            achievements_evaluated: false,
            reversed: true,
            pending: true,
        }
    }

    pub fn leveled_up(&self) -> bool {
        self.new_level > self.previous_level
    }

    /// Identifiers unlocked during this cycle, in unlock order.
    pub fn newly_unlocked(&self) -> Vec<AchievementId> {
        self.unlocks
            .iter()
            .map(|unlock| unlock.achievement_id.clone())
            .collect()
    }
}

/// Snapshot and cycle produced by [`apply_completion`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResult {
    pub snapshot: StatSnapshot,
    pub cycle: ProgressCycle,
    /// `true` when the session had already been applied.
    pub replayed: bool,
}

/// Fold a completed session into `snapshot`.
///
/// Order: totals, streak, session XP, then achievements evaluated until no
/// further unlock qualifies (XP from one unlock may satisfy another). A
/// repeatable achievement unlocks at most once per cycle. Passing `None` for
/// `catalog` skips achievements; the cycle records that they were not
/// evaluated.
///
/// Applying the same session twice returns the remembered cycle and leaves
/// the snapshot untouched. The new cycle stays pending, and so cannot be
/// evicted, until the session acknowledges it through
/// [`StatSnapshot::settle_cycle`].
pub fn apply_completion(
    mut snapshot: StatSnapshot,
    outcome: &SessionOutcome,
    catalog: Option<&[AchievementDefinition]>,
    policy: &ProgressPolicy,
) -> CompletionResult {
    if let Some(cycle) = snapshot.cycle_for(outcome.session_id).cloned() {
        return CompletionResult {
            snapshot,
            cycle,
            replayed: true,
        };
    }

    let previous_level = snapshot.level();
    let xp_before = snapshot.total_xp();
    let practice_date = policy.calendar.date_of(outcome.started_at);
    let streak = snapshot.record_practice(outcome.duration_minutes, practice_date);
    let session_xp = policy.session_xp(outcome.duration_minutes);
    snapshot.apply_xp(session_xp, &policy.curve);

    let unlocks = match catalog {
        Some(catalog) => unlock_until_settled(&mut snapshot, outcome, catalog, policy),
        None => Vec::new(),
    };

    let cycle = ProgressCycle {
        session_id: outcome.session_id,
        practice_date,
        ended_at: outcome.ended_at,
        minutes: outcome.duration_minutes,
        session_xp,
        xp_gained: snapshot.total_xp().saturating_sub(xp_before),
        previous_level,
        new_level: snapshot.level(),
        new_streak: streak.current,
        unlocks,
        achievements_evaluated: catalog.is_some(),
        reversed: false,
        pending: true,
    };
    snapshot.push_cycle(cycle.clone());

    CompletionResult {
        snapshot,
        cycle,
        replayed: false,
    }
}

fn unlock_until_settled(
    snapshot: &mut StatSnapshot,
    outcome: &SessionOutcome,
    catalog: &[AchievementDefinition],
    policy: &ProgressPolicy,
) -> Vec<AchievementUnlock> {
    let engine = AchievementEngine::new(policy.reward_rounding);
    let mut granted = BTreeSet::new();
    let mut unlocks = Vec::new();

    loop {
        let decisions: Vec<_> = engine
            .evaluate(snapshot, catalog, snapshot.unlocked_achievements())
            .into_iter()
            .filter(|decision| !granted.contains(&decision.achievement_id))
            .collect();
        if decisions.is_empty() {
            return unlocks;
        }

        for decision in decisions {
            snapshot.apply_xp(decision.xp_awarded, &policy.curve);
            snapshot.record_unlock(&decision);
            granted.insert(decision.achievement_id.clone());
            unlocks.push(AchievementUnlock {
                user_id: outcome.user_id.clone(),
                achievement_id: decision.achievement_id,
                xp_awarded: decision.xp_awarded,
                unlocked_at: outcome.ended_at,
                session_id: outcome.session_id,
                repeatable: decision.repeatable,
            });
        }
    }
}

#[cfg(test)]
#[path = "cycle_tests.rs"]
mod tests;

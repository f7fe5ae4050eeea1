//! Per-user aggregate of practice statistics.

use std::collections::{BTreeSet, VecDeque};

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::achievements::UnlockDecision;
use crate::domain::sessions::SessionOutcome;
use crate::domain::{AchievementId, ChallengeId, SessionId, UserId};

use super::{LevelAward, LevelCurve, ProgressCycle, StreakUpdate, advance};

/// Number of settled completion cycles remembered for idempotent replays.
/// Pending cycles do not count against it.
pub const RECENT_CYCLE_CAPACITY: usize = 64;

/// Validation errors raised when rebuilding a snapshot from stored data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotValidationError {
    #[error("longest streak {longest} is shorter than current streak {current}")]
    LongestBelowCurrent { current: u32, longest: u32 },
    #[error("level must be at least 1")]
    LevelZero,
    #[error("at most {max} settled cycles may be stored, found {actual}")]
    TooManyCycles { max: usize, actual: usize },
}

/// Named statistics that achievement conditions can inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatField {
    TotalPracticeMinutes,
    TotalSessions,
    CurrentStreak,
    LongestStreak,
    TotalXp,
    Level,
    UnlockedAchievements,
    Badges,
    Titles,
}

/// Borrowed view of one snapshot statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatValue<'a> {
    /// Counter-style statistic.
    Number(u64),
    /// Unlocked achievement identifiers.
    Achievements(&'a BTreeSet<AchievementId>),
    /// Badges or titles.
    Labels(&'a BTreeSet<String>),
}

impl StatValue<'_> {
    /// Whether a set-valued statistic contains `needle`. Numbers never do.
    pub fn contains(&self, needle: &str) -> bool {
        match self {
            Self::Number(_) => false,
            Self::Achievements(ids) => ids.iter().any(|id| id.as_str() == needle),
            Self::Labels(labels) => labels.contains(needle),
        }
    }
}

/// A user's lifetime practice statistics.
///
/// ## Invariants
/// - `longest_streak >= current_streak`.
/// - `total_xp` never decreases and `unlocked_achievements` only grows.
/// - `level >= 1`.
///
/// Only the progress coordinator mutates snapshots; challenges read the
/// deltas recorded in [`ProgressCycle`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StatSnapshotDraft", into = "StatSnapshotDraft")]
pub struct StatSnapshot {
    user_id: UserId,
    total_practice_minutes: u64,
    total_sessions: u64,
    current_streak: u32,
    longest_streak: u32,
    last_practice_date: Option<NaiveDate>,
    total_xp: u64,
    level: u32,
    unlocked_achievements: BTreeSet<AchievementId>,
    badges: BTreeSet<String>,
    titles: BTreeSet<String>,
    recent_cycles: VecDeque<ProgressCycle>,
    rewarded_challenges: BTreeSet<ChallengeId>,
}

/// Unvalidated snapshot fields, used for storage and fixtures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatSnapshotDraft {
    pub user_id: UserId,
    pub total_practice_minutes: u64,
    pub total_sessions: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_practice_date: Option<NaiveDate>,
    pub total_xp: u64,
    pub level: u32,
    #[serde(default)]
    pub unlocked_achievements: BTreeSet<AchievementId>,
    #[serde(default)]
    pub badges: BTreeSet<String>,
    #[serde(default)]
    pub titles: BTreeSet<String>,
    #[serde(default)]
    pub recent_cycles: Vec<ProgressCycle>,
    #[serde(default)]
    pub rewarded_challenges: BTreeSet<ChallengeId>,
}

impl StatSnapshotDraft {
    /// Draft for a user who has never practised.
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            total_practice_minutes: 0,
            total_sessions: 0,
            current_streak: 0,
            longest_streak: 0,
            last_practice_date: None,
            total_xp: 0,
            level: 1,
            unlocked_achievements: BTreeSet::new(),
            badges: BTreeSet::new(),
            titles: BTreeSet::new(),
            recent_cycles: Vec::new(),
            rewarded_challenges: BTreeSet::new(),
        }
    }
}

impl TryFrom<StatSnapshotDraft> for StatSnapshot {
    type Error = SnapshotValidationError;

    fn try_from(draft: StatSnapshotDraft) -> Result<Self, Self::Error> {
        if draft.longest_streak < draft.current_streak {
            return Err(SnapshotValidationError::LongestBelowCurrent {
                current: draft.current_streak,
                longest: draft.longest_streak,
            });
        }
        if draft.level == 0 {
            return Err(SnapshotValidationError::LevelZero);
        }
        let settled = settled_count(&draft.recent_cycles);
        if settled > RECENT_CYCLE_CAPACITY {
            return Err(SnapshotValidationError::TooManyCycles {
                max: RECENT_CYCLE_CAPACITY,
                actual: settled,
            });
        }

        Ok(Self {
            user_id: draft.user_id,
            total_practice_minutes: draft.total_practice_minutes,
            total_sessions: draft.total_sessions,
            current_streak: draft.current_streak,
            longest_streak: draft.longest_streak,
            last_practice_date: draft.last_practice_date,
            total_xp: draft.total_xp,
            level: draft.level,
            unlocked_achievements: draft.unlocked_achievements,
            badges: draft.badges,
            titles: draft.titles,
            recent_cycles: draft.recent_cycles.into(),
            rewarded_challenges: draft.rewarded_challenges,
        })
    }
}

impl From<StatSnapshot> for StatSnapshotDraft {
    fn from(value: StatSnapshot) -> Self {
        Self {
            user_id: value.user_id,
            total_practice_minutes: value.total_practice_minutes,
            total_sessions: value.total_sessions,
            current_streak: value.current_streak,
            longest_streak: value.longest_streak,
            last_practice_date: value.last_practice_date,
            total_xp: value.total_xp,
            level: value.level,
            unlocked_achievements: value.unlocked_achievements,
            badges: value.badges,
            titles: value.titles,
            recent_cycles: value.recent_cycles.into(),
            rewarded_challenges: value.rewarded_challenges,
        }
    }
}

impl StatSnapshot {
    /// Snapshot for a user who has never practised.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            total_practice_minutes: 0,
            total_sessions: 0,
            current_streak: 0,
            longest_streak: 0,
            last_practice_date: None,
            total_xp: 0,
            level: 1,
            unlocked_achievements: BTreeSet::new(),
            badges: BTreeSet::new(),
            titles: BTreeSet::new(),
            recent_cycles: VecDeque::new(),
            rewarded_challenges: BTreeSet::new(),
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn total_practice_minutes(&self) -> u64 {
        self.total_practice_minutes
    }

    pub fn total_sessions(&self) -> u64 {
        self.total_sessions
    }

    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    pub fn longest_streak(&self) -> u32 {
        self.longest_streak
    }

    pub fn last_practice_date(&self) -> Option<NaiveDate> {
        self.last_practice_date
    }

    pub fn total_xp(&self) -> u64 {
        self.total_xp
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn unlocked_achievements(&self) -> &BTreeSet<AchievementId> {
        &self.unlocked_achievements
    }

    pub fn badges(&self) -> &BTreeSet<String> {
        &self.badges
    }

    pub fn titles(&self) -> &BTreeSet<String> {
        &self.titles
    }

    /// Remembered completion cycles, oldest first.
    pub fn recent_cycles(&self) -> impl Iterator<Item = &ProgressCycle> {
        self.recent_cycles.iter()
    }

    pub fn rewarded_challenges(&self) -> &BTreeSet<ChallengeId> {
        &self.rewarded_challenges
    }

    /// The remembered cycle produced by completing `session_id`, if any.
    pub fn cycle_for(&self, session_id: SessionId) -> Option<&ProgressCycle> {
        self.recent_cycles
            .iter()
            .find(|cycle| cycle.session_id == session_id)
    }

    /// Streak as it stands on `today`; a streak whose last practice day is
    /// older than yesterday has lapsed and reads as 0.
    pub fn effective_streak(&self, today: NaiveDate) -> u32 {
        let Some(last) = self.last_practice_date else {
            return 0;
        };
        let yesterday = today.checked_sub_days(Days::new(1));
        if last == today || Some(last) == yesterday {
            self.current_streak
        } else {
            0
        }
    }

    /// Read the statistic named by `field`.
    pub fn stat(&self, field: StatField) -> StatValue<'_> {
        match field {
            StatField::TotalPracticeMinutes => StatValue::Number(self.total_practice_minutes),
            StatField::TotalSessions => StatValue::Number(self.total_sessions),
            StatField::CurrentStreak => StatValue::Number(u64::from(self.current_streak)),
            StatField::LongestStreak => StatValue::Number(u64::from(self.longest_streak)),
            StatField::TotalXp => StatValue::Number(self.total_xp),
            StatField::Level => StatValue::Number(u64::from(self.level)),
            StatField::UnlockedAchievements => {
                StatValue::Achievements(&self.unlocked_achievements)
            }
            StatField::Badges => StatValue::Labels(&self.badges),
            StatField::Titles => StatValue::Labels(&self.titles),
        }
    }

    pub(crate) fn record_practice(&mut self, minutes: u32, practice_date: NaiveDate) -> StreakUpdate {
        self.total_practice_minutes = self
            .total_practice_minutes
            .saturating_add(u64::from(minutes));
        self.total_sessions = self.total_sessions.saturating_add(1);

        let update = advance(
            self.last_practice_date,
            practice_date,
            self.current_streak,
            self.longest_streak,
        );
        self.current_streak = update.current;
        self.longest_streak = update.longest;
        self.last_practice_date = self.last_practice_date.max(Some(practice_date));
        update
    }

    pub(crate) fn apply_xp(&mut self, gained: u64, curve: &LevelCurve) -> LevelAward {
        let mut award = curve.award(self.total_xp, self.level, gained);
        // Lowering the curve in configuration never demotes a user.
        award.level = award.level.max(self.level);
        self.total_xp = award.total_xp;
        self.level = award.level;
        award
    }

    pub(crate) fn record_unlock(&mut self, decision: &UnlockDecision) {
        self.unlocked_achievements
            .insert(decision.achievement_id.clone());
        if let Some(badge) = &decision.badge {
            self.badges.insert(badge.clone());
        }
        if let Some(title) = &decision.title {
            self.titles.insert(title.clone());
        }
    }

    pub(crate) fn record_labels(&mut self, badge: Option<&str>, title: Option<&str>) {
        if let Some(badge) = badge {
            self.badges.insert(badge.to_owned());
        }
        if let Some(title) = title {
            self.titles.insert(title.to_owned());
        }
    }

    pub(crate) fn mark_challenge_rewarded(&mut self, challenge_id: ChallengeId) -> bool {
        self.rewarded_challenges.insert(challenge_id)
    }

    pub(crate) fn push_cycle(&mut self, cycle: ProgressCycle) {
        self.recent_cycles.push_back(cycle);
        self.evict_settled();
    }

    /// Mark the cycle for `session_id` as acknowledged by its session, making
    /// it eligible for eviction. Returns `false` when there was nothing to
    /// settle.
    pub(crate) fn settle_cycle(&mut self, session_id: SessionId) -> bool {
        let Some(cycle) = self
            .recent_cycles
            .iter_mut()
            .find(|cycle| cycle.session_id == session_id && cycle.pending)
        else {
            return false;
        };
        cycle.pending = false;
        self.evict_settled();
        true
    }

    fn evict_settled(&mut self) {
        while settled_count(&self.recent_cycles) > RECENT_CYCLE_CAPACITY {
            let Some(oldest) = self.recent_cycles.iter().position(|cycle| !cycle.pending) else {
                return;
            };
            self.recent_cycles.remove(oldest);
        }
    }

    /// Subtract a deleted session's minutes and count.
    ///
    /// Returns `false` when a remembered cycle shows the reversal already
    /// happened. The reversed cycle is left pending, so it stays remembered
    /// until the deletion is settled. When the completion cycle was already
    /// evicted a pending reversal marker takes its place. XP, streaks, and
    /// unlocks are left as they are.
    pub(crate) fn reverse_session(
        &mut self,
        outcome: &SessionOutcome,
        practice_date: NaiveDate,
    ) -> bool {
        let minutes = match self
            .recent_cycles
            .iter_mut()
            .find(|cycle| cycle.session_id == outcome.session_id)
        {
            Some(cycle) if cycle.reversed => return false,
            Some(cycle) => {
                cycle.reversed = true;
                cycle.pending = true;
                cycle.minutes
            }
            None => {
                let marker = ProgressCycle::reversal(
                    outcome,
                    practice_date,
                    self.level,
                    self.current_streak,
                );
                self.recent_cycles.push_back(marker);
                outcome.duration_minutes
            }
        };

        self.total_practice_minutes = self
            .total_practice_minutes
            .saturating_sub(u64::from(minutes));
        self.total_sessions = self.total_sessions.saturating_sub(1);
        true
    }
}

fn settled_count<'a>(cycles: impl IntoIterator<Item = &'a ProgressCycle>) -> usize {
    cycles.into_iter().filter(|cycle| !cycle.pending).count()
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;

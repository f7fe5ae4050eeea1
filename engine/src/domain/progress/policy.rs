//! Tunable rules applied when turning sessions into progress.

use std::num::NonZeroU32;

use crate::domain::achievements::RewardRounding;

use super::{LevelCurve, StreakCalendar};

/// Default minutes of practice per XP point.
pub const DEFAULT_MINUTES_PER_XP: u32 = 5;
/// Default number of read-modify-write attempts per aggregate.
pub const DEFAULT_MAX_SAVE_ATTEMPTS: u32 = 3;

/// Rules shared by the progress coordinator and the services built on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressPolicy {
    /// Calendar used to derive practice days.
    pub calendar: StreakCalendar,
    /// XP to level conversion.
    pub curve: LevelCurve,
    /// Minutes of practice earning one XP point.
    pub minutes_per_xp: NonZeroU32,
    /// Rounding applied to rarity-scaled achievement rewards.
    pub reward_rounding: RewardRounding,
    /// Attempts per aggregate before surfacing a concurrency conflict.
    pub max_save_attempts: NonZeroU32,
}

impl ProgressPolicy {
    /// XP earned by a session of `duration_minutes`.
    ///
    /// # Examples
    /// ```
    /// use practice_engine::domain::progress::ProgressPolicy;
    ///
    /// let policy = ProgressPolicy::default();
    /// assert_eq!(policy.session_xp(10), 2);
    /// assert_eq!(policy.session_xp(4), 0);
    /// ```
    pub fn session_xp(&self, duration_minutes: u32) -> u64 {
        u64::from(duration_minutes / self.minutes_per_xp.get())
    }
}

impl Default for ProgressPolicy {
    fn default() -> Self {
        Self {
            calendar: StreakCalendar::default(),
            curve: LevelCurve::default(),
            minutes_per_xp: NonZeroU32::new(DEFAULT_MINUTES_PER_XP).unwrap_or(NonZeroU32::MIN),
            reward_rounding: RewardRounding::default(),
            max_save_attempts: NonZeroU32::new(DEFAULT_MAX_SAVE_ATTEMPTS)
                .unwrap_or(NonZeroU32::MIN),
        }
    }
}

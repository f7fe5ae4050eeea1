//! XP to level conversion.

use serde::{Deserialize, Serialize};

/// Default XP needed to reach level 2.
pub const DEFAULT_LEVEL_BASE_XP: u64 = 100;
/// Default level cap.
pub const DEFAULT_MAX_LEVEL: u32 = 100;

/// Result of awarding XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelAward {
    /// XP total after the award.
    pub total_xp: u64,
    /// Level reached by `total_xp`.
    pub level: u32,
    /// Level held before the award.
    pub previous_level: u32,
    /// Whether `level` exceeds `previous_level`.
    pub leveled_up: bool,
}

/// Position within the current level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    /// Current level.
    pub level: u32,
    /// XP earned since reaching `level`.
    pub xp_into_level: u64,
    /// XP still missing for the next level; `None` at the cap.
    pub xp_to_next: Option<u64>,
}

/// Triangular level curve.
///
/// Reaching level *n* requires `base_xp * n * (n - 1) / 2` cumulative XP, so
/// each level costs `base_xp` more than the previous one.
///
/// # Examples
/// ```
/// use practice_engine::domain::progress::LevelCurve;
///
/// let curve = LevelCurve::default();
/// assert_eq!(curve.threshold(2), 100);
/// assert_eq!(curve.threshold(3), 300);
/// let award = curve.award(250, 2, 60);
/// assert_eq!((award.total_xp, award.level, award.leveled_up), (310, 3, true));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelCurve {
    base_xp: u64,
    max_level: u32,
}

impl LevelCurve {
    /// Build a curve; returns `None` when either parameter is zero.
    pub fn new(base_xp: u64, max_level: u32) -> Option<Self> {
        (base_xp > 0 && max_level > 0).then_some(Self { base_xp, max_level })
    }

    /// XP needed to reach level 2.
    pub fn base_xp(&self) -> u64 {
        self.base_xp
    }

    /// Highest reachable level.
    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    /// Cumulative XP threshold of `level`. Levels 0 and 1 both start at 0.
    pub fn threshold(&self, level: u32) -> u64 {
        if level <= 1 {
            return 0;
        }
        let n = u64::from(level);
        // n * (n - 1) is always even.
        self.base_xp.saturating_mul(n.saturating_mul(n - 1) / 2)
    }

    /// Largest level whose threshold does not exceed `total_xp`.
    pub fn level_for(&self, total_xp: u64) -> u32 {
        let mut level = 1;
        while level < self.max_level && self.threshold(level + 1) <= total_xp {
            level += 1;
        }
        level
    }

    /// Add `gained` XP and recompute the level.
    pub fn award(&self, current_xp: u64, current_level: u32, gained: u64) -> LevelAward {
        let total_xp = current_xp.saturating_add(gained);
        let level = self.level_for(total_xp);
        LevelAward {
            total_xp,
            level,
            previous_level: current_level,
            leveled_up: level > current_level,
        }
    }

    /// Describe how far `total_xp` sits into its level.
    pub fn progress(&self, total_xp: u64) -> LevelProgress {
        let level = self.level_for(total_xp);
        let floor = self.threshold(level);
        let xp_to_next = (level < self.max_level)
            .then(|| self.threshold(level + 1).saturating_sub(total_xp));
        LevelProgress {
            level,
            xp_into_level: total_xp.saturating_sub(floor),
            xp_to_next,
        }
    }
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self {
            base_xp: DEFAULT_LEVEL_BASE_XP,
            max_level: DEFAULT_MAX_LEVEL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 1)]
    #[case(99, 1)]
    #[case(100, 2)]
    #[case(299, 2)]
    #[case(300, 3)]
    #[case(600, 4)]
    fn level_for_uses_cumulative_thresholds(#[case] xp: u64, #[case] level: u32) {
        assert_eq!(LevelCurve::default().level_for(xp), level);
    }

    #[rstest]
    fn award_adds_xp_exactly() {
        let award = LevelCurve::default().award(95, 1, 4);
        assert_eq!(award.total_xp, 99);
        assert_eq!(award.level, 1);
        assert!(!award.leveled_up);
    }

    #[rstest]
    fn award_can_jump_several_levels() {
        let award = LevelCurve::default().award(0, 1, 1_000);
        assert_eq!(award.level, 5);
        assert_eq!(award.previous_level, 1);
        assert!(award.leveled_up);
    }

    #[rstest]
    fn level_is_capped() {
        let curve = LevelCurve::new(10, 3).expect("valid curve");
        assert_eq!(curve.level_for(u64::MAX), 3);
        assert_eq!(curve.progress(10_000).xp_to_next, None);
    }

    #[rstest]
    fn award_saturates_instead_of_overflowing() {
        let award = LevelCurve::default().award(u64::MAX - 1, 100, 10);
        assert_eq!(award.total_xp, u64::MAX);
    }

    #[rstest]
    fn progress_reports_distance_to_next_level() {
        let progress = LevelCurve::default().progress(150);
        assert_eq!(progress.level, 2);
        assert_eq!(progress.xp_into_level, 50);
        assert_eq!(progress.xp_to_next, Some(150));
    }

    #[rstest]
    fn zero_parameters_are_rejected() {
        assert!(LevelCurve::new(0, 10).is_none());
        assert!(LevelCurve::new(10, 0).is_none());
    }
}

//! Practice statistics, streaks, and levels.
//!
//! Everything here is synchronous and free of I/O. The progress coordinator
//! loads a [`StatSnapshot`], runs [`apply_completion`], and saves the result.

mod cycle;
mod levels;
mod policy;
mod snapshot;
mod streak;

pub use cycle::{CompletionResult, ProgressCycle, apply_completion};
pub use levels::{
    DEFAULT_LEVEL_BASE_XP, DEFAULT_MAX_LEVEL, LevelAward, LevelCurve, LevelProgress,
};
pub use policy::{DEFAULT_MAX_SAVE_ATTEMPTS, DEFAULT_MINUTES_PER_XP, ProgressPolicy};
pub use snapshot::{
    RECENT_CYCLE_CAPACITY, SnapshotValidationError, StatField, StatSnapshot, StatSnapshotDraft,
    StatValue,
};
pub use streak::{StreakCalendar, StreakUpdate, advance};

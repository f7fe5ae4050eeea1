//! Engine configuration loaded via OrthoConfig.
//!
//! Every value is optional; unset values fall back to the defaults baked into
//! [`ProgressPolicy`]. Environment variables use the `PRACTICE_` prefix, for
//! example `PRACTICE_MINUTES_PER_XP=10`.

use std::num::NonZeroU32;
use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::ProgressPolicy;
use crate::domain::achievements::RewardRounding;
use crate::domain::progress::{
    DEFAULT_LEVEL_BASE_XP, DEFAULT_MAX_LEVEL, DEFAULT_MAX_SAVE_ATTEMPTS, DEFAULT_MINUTES_PER_XP,
    LevelCurve, StreakCalendar,
};

/// Reasons configured values cannot form a policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("minutes_per_xp must be at least 1")]
    ZeroMinutesPerXp,
    #[error("level curve needs a positive base XP and max level (got {base_xp}, {max_level})")]
    InvalidLevelCurve { base_xp: u64, max_level: u32 },
    #[error("UTC offset of {minutes} minutes is out of range")]
    InvalidUtcOffset { minutes: i32 },
    #[error("unknown reward rounding mode: {value}")]
    UnknownRewardRounding { value: String },
    #[error("max_save_attempts must be at least 1")]
    ZeroSaveAttempts,
}

/// Tunables for progression rules and retry behaviour.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PRACTICE")]
pub struct EngineSettings {
    /// Minutes of practice per XP point.
    pub minutes_per_xp: Option<u32>,
    /// XP needed to go from level 1 to level 2.
    pub level_base_xp: Option<u64>,
    /// Level cap.
    pub max_level: Option<u32>,
    /// Fixed offset of the streak calendar from UTC.
    pub calendar_utc_offset_minutes: Option<i32>,
    /// `half_away_from_zero` or `half_even`.
    pub reward_rounding: Option<String>,
    /// Save attempts per aggregate before reporting a conflict.
    pub max_save_attempts: Option<u32>,
    /// JSON achievement catalog used by the replay tool.
    pub catalog_path: Option<PathBuf>,
}

impl EngineSettings {
    pub fn minutes_per_xp(&self) -> u32 {
        self.minutes_per_xp.unwrap_or(DEFAULT_MINUTES_PER_XP)
    }

    pub fn level_base_xp(&self) -> u64 {
        self.level_base_xp.unwrap_or(DEFAULT_LEVEL_BASE_XP)
    }

    pub fn max_level(&self) -> u32 {
        self.max_level.unwrap_or(DEFAULT_MAX_LEVEL)
    }

    pub fn max_save_attempts(&self) -> u32 {
        self.max_save_attempts.unwrap_or(DEFAULT_MAX_SAVE_ATTEMPTS)
    }

    /// Validate the settings and build the policy they describe.
    pub fn to_policy(&self) -> Result<ProgressPolicy, SettingsError> {
        let minutes_per_xp =
            NonZeroU32::new(self.minutes_per_xp()).ok_or(SettingsError::ZeroMinutesPerXp)?;
        let curve = LevelCurve::new(self.level_base_xp(), self.max_level()).ok_or(
            SettingsError::InvalidLevelCurve {
                base_xp: self.level_base_xp(),
                max_level: self.max_level(),
            },
        )?;
        let calendar = match self.calendar_utc_offset_minutes {
            Some(minutes) => StreakCalendar::from_offset_minutes(minutes)
                .ok_or(SettingsError::InvalidUtcOffset { minutes })?,
            None => StreakCalendar::utc(),
        };
        let reward_rounding = match self.reward_rounding.as_deref() {
            Some(raw) => RewardRounding::parse(raw).ok_or_else(|| {
                SettingsError::UnknownRewardRounding {
                    value: raw.to_owned(),
                }
            })?,
            None => RewardRounding::default(),
        };
        let max_save_attempts =
            NonZeroU32::new(self.max_save_attempts()).ok_or(SettingsError::ZeroSaveAttempts)?;

        Ok(ProgressPolicy {
            calendar,
            curve,
            minutes_per_xp,
            reward_rounding,
            max_save_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for engine configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const KEYS: [&str; 7] = [
        "PRACTICE_MINUTES_PER_XP",
        "PRACTICE_LEVEL_BASE_XP",
        "PRACTICE_MAX_LEVEL",
        "PRACTICE_CALENDAR_UTC_OFFSET_MINUTES",
        "PRACTICE_REWARD_ROUNDING",
        "PRACTICE_MAX_SAVE_ATTEMPTS",
        "PRACTICE_CATALOG_PATH",
    ];

    fn load_from_empty_args() -> EngineSettings {
        EngineSettings::load_from_iter([OsString::from("practice-engine")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_match_the_default_policy() {
        let _guard = lock_env(KEYS.map(|key| (key, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(settings.minutes_per_xp(), DEFAULT_MINUTES_PER_XP);
        assert!(settings.catalog_path.is_none());
        assert_eq!(
            settings.to_policy().expect("valid policy"),
            ProgressPolicy::default()
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("PRACTICE_MINUTES_PER_XP", Some("10".to_owned())),
            ("PRACTICE_LEVEL_BASE_XP", Some("50".to_owned())),
            ("PRACTICE_MAX_LEVEL", None::<String>),
            ("PRACTICE_CALENDAR_UTC_OFFSET_MINUTES", Some("-300".to_owned())),
            ("PRACTICE_REWARD_ROUNDING", Some("half_even".to_owned())),
            ("PRACTICE_MAX_SAVE_ATTEMPTS", Some("5".to_owned())),
            ("PRACTICE_CATALOG_PATH", Some("/tmp/catalog.json".to_owned())),
        ]);

        let settings = load_from_empty_args();
        let policy = settings.to_policy().expect("valid policy");
        assert_eq!(policy.minutes_per_xp.get(), 10);
        assert_eq!(policy.curve.base_xp(), 50);
        assert_eq!(policy.calendar.offset_minutes(), -300);
        assert_eq!(policy.reward_rounding, RewardRounding::HalfEven);
        assert_eq!(policy.max_save_attempts.get(), 5);
        assert_eq!(settings.catalog_path, Some(PathBuf::from("/tmp/catalog.json")));
    }

    #[rstest]
    #[case(EngineSettings { minutes_per_xp: Some(0), ..blank_settings() }, SettingsError::ZeroMinutesPerXp)]
    #[case(EngineSettings { max_save_attempts: Some(0), ..blank_settings() }, SettingsError::ZeroSaveAttempts)]
    #[case(
        EngineSettings { level_base_xp: Some(0), ..blank_settings() },
        SettingsError::InvalidLevelCurve { base_xp: 0, max_level: DEFAULT_MAX_LEVEL }
    )]
    #[case(
        EngineSettings { calendar_utc_offset_minutes: Some(24 * 60), ..blank_settings() },
        SettingsError::InvalidUtcOffset { minutes: 24 * 60 }
    )]
    #[case(
        EngineSettings { reward_rounding: Some("ceiling".to_owned()), ..blank_settings() },
        SettingsError::UnknownRewardRounding { value: "ceiling".to_owned() }
    )]
    fn invalid_values_are_rejected(#[case] settings: EngineSettings, #[case] expected: SettingsError) {
        assert_eq!(settings.to_policy(), Err(expected));
    }

    fn blank_settings() -> EngineSettings {
        EngineSettings {
            minutes_per_xp: None,
            level_base_xp: None,
            max_level: None,
            calendar_utc_offset_minutes: None,
            reward_rounding: None,
            max_save_attempts: None,
            catalog_path: None,
        }
    }
}

//! Streak continuation and reset over calendar days.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Result of advancing a streak by one practice day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakUpdate {
    /// Streak length after the practice day.
    pub current: u32,
    /// Longest streak ever observed, including `current`.
    pub longest: u32,
}

/// Advance a streak for a practice day.
///
/// - Practising the day after `last_practice_date` extends the streak.
/// - Practising again on `last_practice_date` keeps it unchanged.
/// - Any larger gap, or no prior practice, restarts it at 1.
/// - A practice day earlier than `last_practice_date` (a late backfill)
///   leaves the streak unchanged.
///
/// The longest streak never drops below the returned current streak.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use practice_engine::domain::progress::advance;
///
/// let today = NaiveDate::from_ymd_opt(2026, 3, 10).expect("date");
/// let yesterday = NaiveDate::from_ymd_opt(2026, 3, 9).expect("date");
/// let update = advance(Some(yesterday), today, 5, 5);
/// assert_eq!((update.current, update.longest), (6, 6));
/// ```
pub fn advance(
    last_practice_date: Option<NaiveDate>,
    today: NaiveDate,
    current_streak: u32,
    longest_streak: u32,
) -> StreakUpdate {
    let current = match last_practice_date {
        Some(last) if last == today => current_streak,
        Some(last) if last > today => current_streak,
        Some(last) if last.checked_add_days(Days::new(1)) == Some(today) => {
            current_streak.saturating_add(1)
        }
        _ => 1,
    };

    StreakUpdate {
        current,
        longest: longest_streak.max(current),
    }
}

/// The single calendar used to turn timestamps into practice days.
///
/// A fixed UTC offset keeps streak arithmetic deterministic around midnight
/// regardless of where the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakCalendar {
    offset: FixedOffset,
}

impl StreakCalendar {
    /// Calendar anchored at UTC.
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// Calendar anchored at a fixed offset east of UTC, in minutes.
    ///
    /// Returns `None` when the offset is not strictly within ±24 hours.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        let seconds = minutes.checked_mul(60)?;
        FixedOffset::east_opt(seconds).map(|offset| Self { offset })
    }

    /// Offset east of UTC, in minutes.
    pub fn offset_minutes(&self) -> i32 {
        self.offset.local_minus_utc() / 60
    }

    /// Calendar day containing `at`.
    pub fn date_of(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }
}

impl Default for StreakCalendar {
    fn default() -> Self {
        Self::utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).expect("valid date")
    }

    #[rstest]
    #[case(Some(day(9)), 5, 5, (6, 6))]
    #[case(Some(day(10)), 6, 6, (6, 6))]
    #[case(Some(day(7)), 6, 10, (1, 10))]
    #[case(None, 0, 0, (1, 1))]
    #[case(Some(day(9)), 2, 9, (3, 9))]
    #[case(Some(day(12)), 4, 4, (4, 4))]
    fn advance_follows_calendar_rules(
        #[case] last: Option<NaiveDate>,
        #[case] current: u32,
        #[case] longest: u32,
        #[case] expected: (u32, u32),
    ) {
        let update = advance(last, day(10), current, longest);
        assert_eq!((update.current, update.longest), expected);
    }

    #[rstest]
    fn advance_crosses_month_boundaries() {
        let last = NaiveDate::from_ymd_opt(2026, 2, 28).expect("valid date");
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date");
        assert_eq!(advance(Some(last), today, 3, 3).current, 4);
    }

    #[rstest]
    fn longest_never_trails_current() {
        for gap in 0..5_u64 {
            for current in 0..4_u32 {
                for longest in current..6 {
                    let last = day(10).checked_sub_days(Days::new(gap));
                    let update = advance(last, day(10), current, longest);
                    assert!(update.longest >= update.current);
                }
            }
        }
    }

    #[rstest]
    #[case(0, day(10))]
    #[case(60, day(11))]
    #[case(-120, day(10))]
    fn calendar_applies_fixed_offset(#[case] minutes: i32, #[case] expected: NaiveDate) {
        let calendar = StreakCalendar::from_offset_minutes(minutes).expect("valid offset");
        let late_evening = Utc
            .with_ymd_and_hms(2026, 3, 10, 23, 30, 0)
            .single()
            .expect("valid time");
        assert_eq!(calendar.date_of(late_evening), expected);
    }

    #[rstest]
    fn calendar_rejects_out_of_range_offsets() {
        assert!(StreakCalendar::from_offset_minutes(24 * 60).is_none());
        assert_eq!(StreakCalendar::default().offset_minutes(), 0);
    }
}

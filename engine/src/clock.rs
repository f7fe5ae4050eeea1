//! Clock that only moves when told to.
//!
//! Services read time through [`mockable::Clock`]. The replay tool and the
//! tests drive them with this clock so every timestamp is scripted.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

/// Settable [`Clock`].
#[derive(Debug)]
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance_minutes(&self, minutes: i64) {
        *self.lock_clock() += TimeDelta::minutes(minutes);
    }

    pub fn advance_days(&self, days: i64) {
        *self.lock_clock() += TimeDelta::days(days);
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock_clock() = now;
    }

    // The guarded value is a plain timestamp; a panicking writer cannot leave
    // it half-updated, so a poisoned lock is still usable.
    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

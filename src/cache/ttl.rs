// Expiry evaluation for cache entries.
// Ages are counted in whole days; the current time always comes from a Clock.

use std::sync::Mutex;

use chrono::{Local, NaiveDateTime, TimeDelta};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time. Backing files store naive local timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Whole days elapsed from `created_at` to `now`, floored.
///
/// A `now` earlier than `created_at` yields a negative count.
pub fn elapsed_days(created_at: NaiveDateTime, now: NaiveDateTime) -> i64 {
    now.signed_duration_since(created_at)
        .num_milliseconds()
        .div_euclid(MILLIS_PER_DAY)
}

/// True iff more than `ttl_days` whole days separate `created_at` and `now`.
pub fn is_expired(created_at: NaiveDateTime, ttl_days: i64, now: NaiveDateTime) -> bool {
    elapsed_days(created_at, now) > ttl_days
}

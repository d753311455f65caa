// src/time/mod.rs

//! Day-boundary arithmetic and activity time windows.
//!
//! - [`TimePolicy`] is the single rule deciding which "game day" an instant
//!   belongs to. It is a plain value handed to every computation that cares
//!   about days, so there is no process-wide timezone state.
//! - [`resolver`] turns an activity's declared time mode into the concrete
//!   instants that apply to one player.

use serde::Deserialize;

pub mod resolver;

pub use resolver::{ResolvedWindow, resolve_window};

pub const SECS_PER_HOUR: i64 = 3600;
pub const SECS_PER_DAY: i64 = 86_400;

/// Timezone offset and daily rollover hour used for every day computation.
///
/// `day_index(t) = floor((t + (timezone_offset_hours - daily_rollover_hour) * 3600) / 86400)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimePolicy {
    #[serde(default = "default_timezone_offset_hours")]
    pub timezone_offset_hours: i32,
    #[serde(default = "default_daily_rollover_hour")]
    pub daily_rollover_hour: i32,
}

fn default_timezone_offset_hours() -> i32 {
    8
}

fn default_daily_rollover_hour() -> i32 {
    5
}

impl Default for TimePolicy {
    fn default() -> Self {
        Self {
            timezone_offset_hours: default_timezone_offset_hours(),
            daily_rollover_hour: default_daily_rollover_hour(),
        }
    }
}

impl TimePolicy {
    pub fn new(timezone_offset_hours: i32, daily_rollover_hour: i32) -> Self {
        Self {
            timezone_offset_hours,
            daily_rollover_hour,
        }
    }

    fn shift(&self) -> i64 {
        i64::from(self.timezone_offset_hours - self.daily_rollover_hour) * SECS_PER_HOUR
    }

    /// Game-day number of `t`. Monotone non-decreasing in `t`.
    pub fn day_index(&self, t: i64) -> i64 {
        (t + self.shift()).div_euclid(SECS_PER_DAY)
    }

    /// Number of day boundaries crossed going from `old` to `now`.
    pub fn diff_days(&self, now: i64, old: i64) -> i64 {
        self.day_index(now) - self.day_index(old)
    }

    pub fn is_differ_day(&self, a: i64, b: i64) -> bool {
        self.day_index(a) != self.day_index(b)
    }

    /// Monday-based week number of `t`'s game day. Day 0 (1970-01-01) was a
    /// Thursday.
    pub fn week_index(&self, t: i64) -> i64 {
        (self.day_index(t) + 3).div_euclid(7)
    }

    pub fn is_differ_week(&self, a: i64, b: i64) -> bool {
        self.week_index(a) != self.week_index(b)
    }

    /// First second of the game day containing `t`.
    pub fn start_of_day(&self, t: i64) -> i64 {
        self.day_index(t) * SECS_PER_DAY - self.shift()
    }
}

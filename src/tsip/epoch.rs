use chrono::{DateTime, Utc};
use log::{debug, warn};

// 1980-01-06T00:00:00Z
pub const GPS_EPOCH_UNIX: i64 = 315_964_800;
pub const SECS_PER_WEEK: i64 = 604_800;
pub const WEEK_ROLLOVER: u32 = 1024;

const NANOS_PER_SEC: i64 = 1_000_000_000;

// Time of week at nanosecond resolution. Equality on this is what decides
// whether a packet belongs to the epoch in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct TimeOfWeek {
    nanos: i64,
}

impl TimeOfWeek {
    // Whole seconds are truncated, the fraction is kept to the nanosecond.
    pub fn from_secs_f64(secs: f64) -> Self {
        let whole = secs.trunc();
        let frac = ((secs - whole) * 1e9) as i64;
        Self {
            nanos: (whole as i64) * NANOS_PER_SEC + frac,
        }
    }

    pub fn from_millis(ms: u32) -> Self {
        Self {
            nanos: i64::from(ms) * 1_000_000,
        }
    }

    pub fn from_secs(secs: u32) -> Self {
        Self {
            nanos: i64::from(secs) * NANOS_PER_SEC,
        }
    }

    pub fn secs(&self) -> i64 {
        self.nanos.div_euclid(NANOS_PER_SEC)
    }

    pub fn subsec_nanos(&self) -> u32 {
        self.nanos.rem_euclid(NANOS_PER_SEC) as u32
    }
}

// Session clock context: leap seconds and the current GPS week.
#[derive(Debug, Clone)]
pub struct GpsClock {
    pub leap_seconds: i32,
    pub leap_valid: bool,
    pub week: u32,
    pub time_valid: bool,
    // Rollovers to assume for 10-bit week numbers.
    pub rollovers: u32,
}

impl GpsClock {
    pub fn new(leap_seconds: i32, rollovers: u32) -> Self {
        Self {
            leap_seconds,
            leap_valid: false,
            week: 0,
            time_valid: false,
            rollovers,
        }
    }

    pub fn set_leap_seconds(&mut self, leap: i32) {
        self.leap_seconds = leap;
        self.leap_valid = true;
    }

    // Resolve (week, tow) to UTC. Also makes `week` the session's current week.
    pub fn resolve(&mut self, week: u32, tow: TimeOfWeek) -> Option<DateTime<Utc>> {
        let week = if week < WEEK_ROLLOVER {
            let full = self
                .rollovers
                .checked_mul(WEEK_ROLLOVER)
                .and_then(|base| base.checked_add(week));
            let Some(full) = full else {
                warn!("week {week} with {} rollovers is out of range", self.rollovers);
                return None;
            };
            full
        } else {
            week
        };
        if self.week != week {
            debug!("gps week now {week}");
        }
        self.week = week;
        self.time_valid = true;
        let secs = GPS_EPOCH_UNIX + i64::from(week) * SECS_PER_WEEK + tow.secs()
            - i64::from(self.leap_seconds);
        DateTime::from_timestamp(secs, tow.subsec_nanos())
    }

    // Same as `resolve` against the week already known to the session.
    pub fn resolve_current(&mut self, tow: TimeOfWeek) -> Option<DateTime<Utc>> {
        self.resolve(self.week, tow)
    }
}

// Some firmware guesses the week epoch wrong once leap second 18 exists
// (inserted in week 1930); push such weeks forward by whole rollovers.
pub fn fix_leap_rollover(week: u32, leap_seconds: u32) -> u32 {
    let mut week = week;
    if leap_seconds > 17 && week < 1930 {
        week += WEEK_ROLLOVER;
        if week < 1930 {
            week += WEEK_ROLLOVER;
        }
    }
    week
}

// Remembers the last fix time of week; a change marks a new epoch.
#[derive(Debug, Clone, Default)]
pub struct TowTracker {
    last: TimeOfWeek,
}

impl TowTracker {
    pub fn observe(&mut self, tow: TimeOfWeek) -> bool {
        if tow == self.last {
            return false;
        }
        self.last = tow;
        true
    }

    pub fn last(&self) -> TimeOfWeek {
        self.last
    }
}

//! Countdown to the next anniversary.
//!
//! The calculator is a pure function of the wall-clock instant it is given.
//! Scheduling the once-per-second recomputation lives in [`crate::clock`].

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default anniversary month (January).
pub const DEFAULT_MONTH: u32 = 1;

/// Default anniversary day of month.
pub const DEFAULT_DAY: u32 = 31;

const MILLIS_PER_SECOND: u64 = 1_000;
const MILLIS_PER_MINUTE: u64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: u64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: u64 = 24 * MILLIS_PER_HOUR;

/// Formats accepted by [`parse_instant`], tried in order.
const INSTANT_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Whole days, hours, minutes and seconds until the target instant.
///
/// Hours are always in `0..=23`, minutes and seconds in `0..=59`. Values are
/// replaced wholesale on every tick, never adjusted in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CountdownDuration {
    /// Whole days remaining (unbounded).
    pub days: u64,
    /// Hours past the whole days.
    pub hours: u8,
    /// Minutes past the whole hours.
    pub minutes: u8,
    /// Seconds past the whole minutes.
    pub seconds: u8,
}

impl CountdownDuration {
    /// The terminal duration: the anniversary is now.
    pub const ZERO: Self = Self {
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
    };

    /// Decompose a millisecond difference. Sub-second remainders are dropped.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_millis(diff: u64) -> Self {
        Self {
            days: diff / MILLIS_PER_DAY,
            hours: ((diff / MILLIS_PER_HOUR) % 24) as u8,
            minutes: ((diff / MILLIS_PER_MINUTE) % 60) as u8,
            seconds: ((diff / MILLIS_PER_SECOND) % 60) as u8,
        }
    }

    /// Total whole seconds represented.
    #[must_use]
    pub fn total_seconds(&self) -> u64 {
        self.days * 86_400
            + u64::from(self.hours) * 3_600
            + u64::from(self.minutes) * 60
            + u64::from(self.seconds)
    }

    /// Whether this is the terminal (all-zero) duration.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// The four display cells in order, each with its label.
    #[must_use]
    pub fn labelled(&self) -> [(&'static str, u64); 4] {
        [
            ("Days", self.days),
            ("Hours", u64::from(self.hours)),
            ("Minutes", u64::from(self.minutes)),
            ("Seconds", u64::from(self.seconds)),
        ]
    }
}

impl fmt::Display for CountdownDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// A month/day that recurs every year at local midnight.
///
/// Deserializing goes through [`AnniversaryDate::new`], so an impossible date
/// is rejected rather than silently shifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawAnniversaryDate")]
pub struct AnniversaryDate {
    month: u32,
    day: u32,
}

#[derive(Deserialize)]
struct RawAnniversaryDate {
    month: u32,
    day: u32,
}

impl TryFrom<RawAnniversaryDate> for AnniversaryDate {
    type Error = Error;

    fn try_from(raw: RawAnniversaryDate) -> Result<Self> {
        Self::new(raw.month, raw.day).ok_or_else(|| {
            Error::config_validation(format!(
                "anniversary {:02}-{:02} does not exist",
                raw.month, raw.day
            ))
        })
    }
}

impl Default for AnniversaryDate {
    fn default() -> Self {
        Self {
            month: DEFAULT_MONTH,
            day: DEFAULT_DAY,
        }
    }
}

impl AnniversaryDate {
    /// Create an anniversary date.
    ///
    /// Returns `None` unless the month/day exists in at least a leap year,
    /// so February 29 is accepted and April 31 is not.
    #[must_use]
    pub fn new(month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(2000, month, day).map(|_| Self { month, day })
    }

    /// The anniversary month (1-12).
    #[must_use]
    pub fn month(&self) -> u32 {
        self.month
    }

    /// The anniversary day of month.
    #[must_use]
    pub fn day(&self) -> u32 {
        self.day
    }

    /// Midnight of this anniversary in `year`.
    ///
    /// February 29 falls back to February 28 in non-leap years. Returns `None`
    /// only when `year` is outside chrono's calendar range.
    #[must_use]
    pub fn in_year(&self, year: i32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
            .or_else(|| {
                let leap_day = self.month == 2 && self.day == 29;
                leap_day.then(|| NaiveDate::from_ymd_opt(year, 2, 28)).flatten()
            })
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    }

    /// The target the countdown runs toward as of `now`.
    ///
    /// This year's anniversary unless `now` is strictly past it, in which case
    /// next year's. The exact anniversary instant is still "this year".
    #[must_use]
    pub fn next_occurrence(&self, now: NaiveDateTime) -> NaiveDateTime {
        match self.in_year(now.year()) {
            Some(target) if now <= target => target,
            // Past the end of the representable calendar the countdown saturates.
            _ => self.in_year(now.year() + 1).unwrap_or(now),
        }
    }

    /// Time remaining until the next occurrence.
    #[must_use]
    pub fn compute_remaining(&self, now: NaiveDateTime) -> CountdownDuration {
        let target = self.next_occurrence(now);
        let diff = u64::try_from((target - now).num_milliseconds()).unwrap_or(0);
        CountdownDuration::from_millis(diff)
    }
}

impl fmt::Display for AnniversaryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

/// Time remaining until the next January 31st, 00:00:00.
#[must_use]
pub fn compute_remaining(now: NaiveDateTime) -> CountdownDuration {
    AnniversaryDate::default().compute_remaining(now)
}

/// Parse a local wall-clock instant such as `2026-01-30T00:00:00`.
///
/// A bare date (`2026-01-30`) means midnight.
///
/// # Errors
///
/// Returns [`Error::InvalidInstant`] if no accepted format matches.
pub fn parse_instant(input: &str) -> Result<NaiveDateTime> {
    let trimmed = input.trim();
    INSTANT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| Error::invalid_instant(input))
}

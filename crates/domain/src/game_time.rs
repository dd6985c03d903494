//! In-game calendar.
//!
//! Months are 30 days and years are 12 months. Every arithmetic operation
//! returns a normalized value: `minute` in `[0, 60)`, `hour` in `[0, 24)`,
//! `day` in `[1, 30]`, `month` in `[1, 12]`.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainError;

pub const MINUTES_PER_HOUR: i64 = 60;
pub const HOURS_PER_DAY: i64 = 24;
pub const DAYS_PER_MONTH: i64 = 30;
pub const MONTHS_PER_YEAR: i64 = 12;

const MINUTES_PER_DAY: i64 = MINUTES_PER_HOUR * HOURS_PER_DAY;
const MINUTES_PER_MONTH: i64 = MINUTES_PER_DAY * DAYS_PER_MONTH;
const MINUTES_PER_YEAR: i64 = MINUTES_PER_MONTH * MONTHS_PER_YEAR;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameTime {
    pub year: i64,
    pub month: i64,
    pub day: i64,
    #[serde(default)]
    pub hour: i64,
    #[serde(default)]
    pub minute: i64,
}

impl GameTime {
    pub fn new(year: i64, month: i64, day: i64, hour: i64, minute: i64) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
        }
        .normalized()
    }

    /// Minutes since the calendar epoch (year 0, month 1, day 1, 00:00).
    /// Computed wide so that no combination of fields can overflow.
    pub fn total_minutes(&self) -> i128 {
        i128::from(self.year) * i128::from(MINUTES_PER_YEAR)
            + (i128::from(self.month) - 1) * i128::from(MINUTES_PER_MONTH)
            + (i128::from(self.day) - 1) * i128::from(MINUTES_PER_DAY)
            + i128::from(self.hour) * i128::from(MINUTES_PER_HOUR)
            + i128::from(self.minute)
    }

    /// `None` when the year does not fit in an `i64`.
    pub fn from_total_minutes(total: i128) -> Option<Self> {
        let year = i64::try_from(total.div_euclid(i128::from(MINUTES_PER_YEAR))).ok()?;
        let rest = i64::try_from(total.rem_euclid(i128::from(MINUTES_PER_YEAR))).ok()?;
        let month = rest / MINUTES_PER_MONTH + 1;
        let rest = rest % MINUTES_PER_MONTH;
        let day = rest / MINUTES_PER_DAY + 1;
        let rest = rest % MINUTES_PER_DAY;
        Some(Self {
            year,
            month,
            day,
            hour: rest / MINUTES_PER_HOUR,
            minute: rest % MINUTES_PER_HOUR,
        })
    }

    /// Cascade any out-of-range field into the ones above it. `None` when the
    /// cascade carries the year out of range.
    pub fn checked_normalized(self) -> Option<Self> {
        Self::from_total_minutes(self.total_minutes())
    }

    /// Like [`GameTime::checked_normalized`], keeping the raw fields when the
    /// year would overflow.
    pub fn normalized(self) -> Self {
        self.checked_normalized().unwrap_or(self)
    }

    pub fn checked_add_minutes(self, minutes: i64) -> Option<Self> {
        Self::from_total_minutes(self.total_minutes() + i128::from(minutes))
    }

    /// Minutes elapsed from `earlier` to `self`; negative when `earlier` is
    /// later. Saturates at the `i64` bounds.
    pub fn minutes_since(&self, earlier: &GameTime) -> i64 {
        let elapsed = self.total_minutes() - earlier.total_minutes();
        i64::try_from(elapsed).unwrap_or(if elapsed < 0 { i64::MIN } else { i64::MAX })
    }

    /// Whole years elapsed since a birth date, by calendar position.
    pub fn years_since(&self, year: i64, month: i64, day: i64) -> i64 {
        let mut years = self.year.saturating_sub(year);
        if (self.month, self.day) < (month, day) {
            years = years.saturating_sub(1);
        }
        years.max(0)
    }

    /// Prefix used for memory entries, e.g. `[Year 1000, Month 3, Day 15 08:05]`.
    pub fn stamp(&self) -> String {
        format!(
            "[Year {}, Month {}, Day {} {:02}:{:02}]",
            self.year, self.month, self.day, self.hour, self.minute
        )
    }

    /// Read a calendar record from the tree, normalized. Missing hour/minute
    /// default to 0.
    pub fn from_value(value: &Value) -> Result<Self, DomainError> {
        serde_json::from_value::<GameTime>(value.clone())
            .map_err(|e| DomainError::malformed("gameTime", e))?
            .checked_normalized()
            .ok_or_else(|| DomainError::malformed("gameTime", "year out of range"))
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "year": self.year,
            "month": self.month,
            "day": self.day,
            "hour": self.hour,
            "minute": self.minute,
        })
    }
}

impl Default for GameTime {
    fn default() -> Self {
        Self {
            year: 1000,
            month: 1,
            day: 1,
            hour: 8,
            minute: 0,
        }
    }
}

impl PartialOrd for GameTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.total_minutes().cmp(&other.total_minutes())
    }
}

impl fmt::Display for GameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:02}-{:02} {:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute
        )
    }
}

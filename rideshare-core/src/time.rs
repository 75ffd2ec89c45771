//! Minute-of-day values and their `HH:MM` representation.
//!
//! Commute times are stored as whole minutes since midnight. A
//! [`TimeOfDay`] can only be built from a validated `HH:MM` string or from an
//! integer already inside `0..=1439`; out-of-range values are rejected rather
//! than clamped.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Number of minutes in a day. Valid minute values are `0..MINUTES_PER_DAY`.
pub const MINUTES_PER_DAY: u16 = 1440;

const MINUTES_PER_HOUR: u16 = 60;

/// Minutes since midnight in the inclusive range `0..=1439`.
///
/// # Examples
///
/// ```
/// use rideshare_core::TimeOfDay;
///
/// # fn main() -> Result<(), rideshare_core::TimeError> {
/// let departure: TimeOfDay = "08:30".parse()?;
/// assert_eq!(departure.minutes(), 510);
/// assert_eq!(departure.to_string(), "08:30");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

/// Errors raised when parsing or constructing a [`TimeOfDay`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    /// The input was not a 24-hour `H:MM` or `HH:MM` string.
    #[error("invalid time {input:?}: expected HH:MM in 24-hour format")]
    InvalidFormat {
        /// The rejected input.
        input: String,
    },
    /// A minute value fell outside `0..=1439`.
    #[error("minute value {minutes} is outside 0..=1439")]
    OutOfRange {
        /// The rejected minute value.
        minutes: i64,
    },
}

impl TimeOfDay {
    /// Midnight.
    pub const MIDNIGHT: Self = Self(0);

    /// Build a value from minutes since midnight.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::OutOfRange`] when `minutes` is negative or
    /// greater than 1439.
    pub fn from_minutes(minutes: i64) -> Result<Self, TimeError> {
        u16::try_from(minutes)
            .ok()
            .filter(|value| *value < MINUTES_PER_DAY)
            .map(Self)
            .ok_or(TimeError::OutOfRange { minutes })
    }

    /// Minutes since midnight.
    #[must_use]
    pub const fn minutes(self) -> u16 {
        self.0
    }

    /// Hour component (`0..=23`).
    #[must_use]
    pub const fn hour(self) -> u16 {
        self.0 / MINUTES_PER_HOUR
    }

    /// Minute-of-hour component (`0..=59`).
    #[must_use]
    pub const fn minute(self) -> u16 {
        self.0 % MINUTES_PER_HOUR
    }

    /// Absolute distance in minutes between two times on the same day.
    #[must_use]
    pub const fn abs_diff(self, other: Self) -> u16 {
        self.0.abs_diff(other.0)
    }

    fn parse(input: &str) -> Result<Self, TimeError> {
        let invalid = || TimeError::InvalidFormat {
            input: input.to_owned(),
        };
        let (hours, minutes) = input.split_once(':').ok_or_else(invalid)?;
        if !(1..=2).contains(&hours.len()) || minutes.len() != 2 {
            return Err(invalid());
        }
        if !hours
            .bytes()
            .chain(minutes.bytes())
            .all(|byte| byte.is_ascii_digit())
        {
            return Err(invalid());
        }
        let hours: u16 = hours.parse().map_err(|_| invalid())?;
        let minutes: u16 = minutes.parse().map_err(|_| invalid())?;
        if hours > 23 || minutes > 59 {
            return Err(invalid());
        }
        Ok(Self(hours * MINUTES_PER_HOUR + minutes))
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<i64> for TimeOfDay {
    type Error = TimeError;

    fn try_from(minutes: i64) -> Result<Self, Self::Error> {
        Self::from_minutes(minutes)
    }
}

impl From<TimeOfDay> for u16 {
    fn from(value: TimeOfDay) -> Self {
        value.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for TimeOfDay {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for TimeOfDay {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a 24-hour `H:MM` or `HH:MM` string into a [`TimeOfDay`].
///
/// # Errors
///
/// Returns [`TimeError::InvalidFormat`] for anything else, including
/// `"24:00"`, `"12:60"` and single-digit minutes such as `"8:5"`.
pub fn parse_time_of_day(input: &str) -> Result<TimeOfDay, TimeError> {
    TimeOfDay::parse(input)
}

/// Format minutes since midnight as zero-padded `HH:MM`.
///
/// # Errors
///
/// Returns [`TimeError::OutOfRange`] when `minutes` is outside `0..=1439`.
pub fn format_time_of_day(minutes: i64) -> Result<String, TimeError> {
    TimeOfDay::from_minutes(minutes).map(|time| time.to_string())
}

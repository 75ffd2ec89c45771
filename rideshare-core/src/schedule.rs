//! Recurring commute schedules and the candidate projections read by matching.
//!
//! These types mirror what a schedule repository hands to the core: one
//! [`ScheduleEntry`] per user and weekday, joined with the owning user's
//! public profile as a [`CandidateRow`].

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::{GeoCoordinate, TimeOfDay};

/// Raised when a day-of-week value is outside `0..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("day of week {day} is outside 0..=6")]
pub struct InvalidDayOfWeek {
    /// The rejected value.
    pub day: i64,
}

/// Day of the week, `0` (Sunday) to `6` (Saturday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "i64", into = "u8")
)]
pub struct DayOfWeek(u8);

impl DayOfWeek {
    /// Validate and wrap a day number.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDayOfWeek`] when `day` is outside `0..=6`.
    pub fn new(day: i64) -> Result<Self, InvalidDayOfWeek> {
        u8::try_from(day)
            .ok()
            .filter(|value| *value <= 6)
            .map(Self)
            .ok_or(InvalidDayOfWeek { day })
    }

    /// The day number.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for DayOfWeek {
    type Error = InvalidDayOfWeek;

    fn try_from(day: i64) -> Result<Self, Self::Error> {
        Self::new(day)
    }
}

impl From<DayOfWeek> for u8 {
    fn from(day: DayOfWeek) -> Self {
        day.0
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Raised when a role, role group or direction label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    /// Unrecognised user role.
    #[error("unknown role {input:?}; expected DRIVER, PASSENGER or BOTH")]
    Role {
        /// The rejected label.
        input: String,
    },
    /// Unrecognised search role group.
    #[error("unknown role group {input:?}; expected DRIVER or PASSENGER")]
    RoleGroup {
        /// The rejected label.
        input: String,
    },
    /// Unrecognised commute direction.
    #[error("unknown direction {input:?}; expected TO_CAMPUS or GO_HOME")]
    Direction {
        /// The rejected label.
        input: String,
    },
}

/// Accepts `to-campus`, `to_campus` and `TO_CAMPUS` alike.
fn normalise_label(input: &str) -> String {
    input.trim().to_ascii_uppercase().replace('-', "_")
}

/// A user's registered rideshare role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum Role {
    /// Offers rides.
    Driver,
    /// Looks for rides.
    Passenger,
    /// Either, depending on the day.
    Both,
}

impl Role {
    /// Upper-case label used in storage and on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Driver => "DRIVER",
            Self::Passenger => "PASSENGER",
            Self::Both => "BOTH",
        }
    }

    /// Whether this role can drive.
    #[must_use]
    pub const fn can_drive(self) -> bool {
        matches!(self, Self::Driver | Self::Both)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise_label(s).as_str() {
            "DRIVER" => Ok(Self::Driver),
            "PASSENGER" => Ok(Self::Passenger),
            "BOTH" => Ok(Self::Both),
            _ => Err(LabelError::Role {
                input: s.to_owned(),
            }),
        }
    }
}

/// The counterpart role a requester is searching for.
///
/// Users registered as [`Role::Both`] are eligible for either group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum RoleGroup {
    /// Search for drivers.
    Driver,
    /// Search for passengers.
    Passenger,
}

impl RoleGroup {
    /// Roles eligible for this group.
    ///
    /// ```
    /// use rideshare_core::{Role, RoleGroup};
    ///
    /// assert_eq!(RoleGroup::Driver.roles(), [Role::Driver, Role::Both]);
    /// ```
    #[must_use]
    pub const fn roles(self) -> [Role; 2] {
        match self {
            Self::Driver => [Role::Driver, Role::Both],
            Self::Passenger => [Role::Passenger, Role::Both],
        }
    }
}

impl FromStr for RoleGroup {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise_label(s).as_str() {
            "DRIVER" => Ok(Self::Driver),
            "PASSENGER" => Ok(Self::Passenger),
            _ => Err(LabelError::RoleGroup {
                input: s.to_owned(),
            }),
        }
    }
}

/// Which leg of the daily commute is being matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum Direction {
    /// Morning commute.
    ToCampus,
    /// Return commute.
    GoHome,
}

impl FromStr for Direction {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise_label(s).as_str() {
            "TO_CAMPUS" => Ok(Self::ToCampus),
            "GO_HOME" => Ok(Self::GoHome),
            _ => Err(LabelError::Direction {
                input: s.to_owned(),
            }),
        }
    }
}

/// One user's commute plan for a single weekday.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduleEntry {
    /// Owning user.
    pub owner_user_id: String,
    /// Weekday this entry applies to.
    pub day: DayOfWeek,
    /// Departure time towards campus.
    pub to_campus: TimeOfDay,
    /// Departure time for the trip home.
    pub go_home: TimeOfDay,
    /// Flexibility around `to_campus`, in minutes.
    pub to_campus_flex_minutes: u16,
    /// Flexibility around `go_home`, in minutes.
    pub go_home_flex_minutes: u16,
    /// Largest detour the owner accepts on the way to campus.
    pub to_campus_max_detour_minutes: u32,
    /// Largest detour the owner accepts on the way home.
    pub go_home_max_detour_minutes: u32,
    /// Disabled entries are invisible to matching.
    pub enabled: bool,
}

impl ScheduleEntry {
    /// The departure time for `direction`.
    #[must_use]
    pub const fn time_for(&self, direction: Direction) -> TimeOfDay {
        match direction {
            Direction::ToCampus => self.to_campus,
            Direction::GoHome => self.go_home,
        }
    }

    /// The detour budget for `direction`.
    #[must_use]
    pub const fn max_detour_for(&self, direction: Direction) -> u32 {
        match direction {
            Direction::ToCampus => self.to_campus_max_detour_minutes,
            Direction::GoHome => self.go_home_max_detour_minutes,
        }
    }
}

/// Public profile of a potential match.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CandidateUser {
    /// User identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional avatar URL.
    pub photo_url: Option<String>,
    /// Campus the user commutes to.
    pub campus: String,
    /// Free-text neighbourhood description.
    pub home_area: Option<String>,
    /// Home coordinate, when known.
    pub home: Option<GeoCoordinate>,
    /// Registered role.
    pub role: Role,
    /// IANA time zone name.
    pub time_zone: String,
}

/// The requester's details needed to run a match.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequesterProfile {
    /// User identifier.
    pub id: String,
    /// Campus name as stored; may not be registered.
    pub campus: String,
    /// Free-text neighbourhood description.
    pub home_area: Option<String>,
    /// Home coordinate, when known. `None` selects time-only matching.
    pub home: Option<GeoCoordinate>,
}

/// A candidate profile joined with their schedule entry for the queried day.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CandidateRow {
    /// The entry owner's profile.
    pub candidate: CandidateUser,
    /// The entry for the queried day.
    pub entry: ScheduleEntry,
}

/// An inclusive band of minutes around a target time.
///
/// The bounds may fall outside the day (`earliest < 0` or `latest > 1439`);
/// no wrap-around across midnight is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBand {
    /// Lower bound, inclusive.
    pub earliest: i32,
    /// Upper bound, inclusive.
    pub latest: i32,
}

impl TimeBand {
    /// The band `[target - flexibility, target + flexibility]`.
    #[must_use]
    pub fn around(target: TimeOfDay, flexibility_minutes: u16) -> Self {
        let target = i32::from(target.minutes());
        let flex = i32::from(flexibility_minutes);
        Self {
            earliest: target - flex,
            latest: target + flex,
        }
    }

    /// Whether `time` lies inside the band, bounds included.
    #[must_use]
    pub fn contains(self, time: TimeOfDay) -> bool {
        (self.earliest..=self.latest).contains(&i32::from(time.minutes()))
    }
}

/// Filter passed to [`crate::ScheduleStore::find_candidates`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateQuery {
    /// Weekday to search.
    pub day: DayOfWeek,
    /// Campus the candidate must share with the requester.
    pub campus: String,
    /// The requester, never returned as a candidate.
    pub exclude_user_id: String,
    /// Eligible candidate roles.
    pub roles: Vec<Role>,
    /// Selects the time field the band applies to.
    pub direction: Direction,
    /// Inclusive range for the selected time field.
    pub band: TimeBand,
}

impl CandidateQuery {
    /// Whether `row` satisfies every condition of this query.
    #[must_use]
    pub fn admits(&self, row: &CandidateRow) -> bool {
        row.entry.enabled
            && row.entry.day == self.day
            && row.candidate.id != self.exclude_user_id
            && row.entry.owner_user_id != self.exclude_user_id
            && row.candidate.campus == self.campus
            && self.roles.contains(&row.candidate.role)
            && self.band.contains(row.entry.time_for(self.direction))
    }
}

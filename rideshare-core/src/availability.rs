//! Look up a driver's schedule for a given weekday.

use thiserror::Error;

use crate::{CandidateUser, DayOfWeek, InvalidDayOfWeek, ScheduleEntry, ScheduleStore, StoreError};

/// A driver together with their enabled entry for one weekday.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DriverAvailability {
    /// The driver's public profile.
    pub driver: CandidateUser,
    /// The driver's entry for the requested day.
    pub entry: ScheduleEntry,
}

/// Errors from [`driver_availability`].
#[derive(Debug, Error)]
pub enum AvailabilityError {
    /// The day was outside `0..=6`.
    #[error(transparent)]
    InvalidDay(#[from] InvalidDayOfWeek),
    /// No active user with a driving role has the id.
    #[error("driver {driver_id:?} not found or not available")]
    DriverNotFound {
        /// The requested id.
        driver_id: String,
    },
    /// The driver has no enabled entry for the day.
    #[error("driver {driver_id:?} not available on day {day}")]
    NotAvailableOnDay {
        /// The requested id.
        driver_id: String,
        /// The requested day.
        day: DayOfWeek,
    },
    /// The schedule store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Fetch `driver_id`'s enabled schedule entry for `day`.
///
/// The driver must exist, be active and hold the `DRIVER` or `BOTH` role.
///
/// # Errors
///
/// Returns [`AvailabilityError::InvalidDay`] for days outside `0..=6`,
/// [`AvailabilityError::DriverNotFound`] when the driver check fails, and
/// [`AvailabilityError::NotAvailableOnDay`] when the driver has no enabled
/// entry for the day.
pub async fn driver_availability(
    store: &dyn ScheduleStore,
    driver_id: &str,
    day: i64,
) -> Result<DriverAvailability, AvailabilityError> {
    let day = DayOfWeek::new(day)?;
    let driver = store
        .find_active_driver(driver_id)
        .await?
        .ok_or_else(|| AvailabilityError::DriverNotFound {
            driver_id: driver_id.to_owned(),
        })?;
    let entry = store
        .find_enabled_entry(driver_id, day)
        .await?
        .ok_or_else(|| AvailabilityError::NotAvailableOnDay {
            driver_id: driver_id.to_owned(),
            day,
        })?;
    Ok(DriverAvailability { driver, entry })
}

//! JSON dataset import into the SQLite schedule store.
#![forbid(unsafe_code)]

use std::io::BufReader;

use camino::{Utf8Path, Utf8PathBuf};
use rideshare_core::{DayOfWeek, GeoCoordinate, Role, TimeOfDay};
use rusqlite::{Connection, Error as SqliteError, Transaction};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::schema::{create_schema, enable_foreign_keys};
use crate::fs::{ensure_parent_dir, open_utf8_file};

const DEFAULT_FLEX_MINUTES: u16 = 15;
const DEFAULT_MAX_DETOUR_MINUTES: u32 = 10;
const DEFAULT_TIME_ZONE: &str = "America/Vancouver";

/// Users and schedule entries to load into a store.
///
/// ```
/// use rideshare_data::Dataset;
///
/// let dataset: Dataset = serde_json::from_str(r#"{
///     "users": [{ "id": "u1", "name": "Ada", "campus": "Main Campus", "role": "DRIVER" }],
///     "schedules": [{ "userId": "u1", "dayOfWeek": 1, "toCampus": "08:15", "goHome": "17:00" }]
/// }"#)?;
/// assert_eq!(dataset.schedules[0].to_campus_flex_minutes, 15);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// User records.
    #[serde(default)]
    pub users: Vec<UserRecord>,
    /// Schedule entries; each must reference a user.
    #[serde(default)]
    pub schedules: Vec<ScheduleRecord>,
}

/// A user as stored in a dataset file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Unique user id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional avatar URL.
    #[serde(default)]
    pub photo_url: Option<String>,
    /// Campus name.
    pub campus: String,
    /// Free-text neighbourhood.
    #[serde(default)]
    pub home_area: Option<String>,
    /// Home latitude; ignored unless `home_lng` is also present.
    #[serde(default)]
    pub home_lat: Option<f64>,
    /// Home longitude; ignored unless `home_lat` is also present.
    #[serde(default)]
    pub home_lng: Option<f64>,
    /// Rideshare role.
    pub role: Role,
    /// IANA time zone name.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    /// Inactive users are never matched.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl UserRecord {
    /// Home coordinate when both components are present.
    #[must_use]
    pub fn home(&self) -> Option<GeoCoordinate> {
        self.home_lat
            .zip(self.home_lng)
            .map(|(lat, lng)| GeoCoordinate::new(lat, lng))
    }
}

/// A weekly schedule entry as stored in a dataset file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRecord {
    /// Owning user id.
    pub user_id: String,
    /// Weekday, `0` for Sunday.
    pub day_of_week: DayOfWeek,
    /// Departure towards campus.
    pub to_campus: TimeOfDay,
    /// Departure home.
    pub go_home: TimeOfDay,
    /// Flexibility around `to_campus`.
    #[serde(default = "default_flex", rename = "toCampusFlexMin")]
    pub to_campus_flex_minutes: u16,
    /// Flexibility around `go_home`.
    #[serde(default = "default_flex", rename = "goHomeFlexMin")]
    pub go_home_flex_minutes: u16,
    /// Largest detour accepted on the way to campus.
    #[serde(default = "default_max_detour", rename = "toCampusMaxDetourMin")]
    pub to_campus_max_detour_minutes: u32,
    /// Largest detour accepted on the way home.
    #[serde(default = "default_max_detour", rename = "goHomeMaxDetourMin")]
    pub go_home_max_detour_minutes: u32,
    /// Disabled entries are never matched.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_time_zone() -> String {
    DEFAULT_TIME_ZONE.to_owned()
}

const fn default_true() -> bool {
    true
}

const fn default_flex() -> u16 {
    DEFAULT_FLEX_MINUTES
}

const fn default_max_detour() -> u32 {
    DEFAULT_MAX_DETOUR_MINUTES
}

/// Errors raised when reading a dataset file.
#[derive(Debug, Error)]
pub enum LoadDatasetError {
    /// The file could not be opened.
    #[error("failed to open dataset {path:?}")]
    Open {
        /// Dataset path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a valid dataset document.
    #[error("failed to parse dataset {path:?}")]
    Parse {
        /// Dataset path.
        path: Utf8PathBuf,
        /// Source error produced by `serde_json`.
        #[source]
        source: serde_json::Error,
    },
}

/// Read a JSON dataset from disk.
///
/// # Errors
///
/// Returns [`LoadDatasetError`] when the file cannot be opened or parsed.
pub fn load_dataset(path: &Utf8Path) -> Result<Dataset, LoadDatasetError> {
    let file = open_utf8_file(path).map_err(|source| LoadDatasetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| LoadDatasetError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Errors raised when persisting a dataset to SQLite.
#[derive(Debug, Error)]
pub enum PersistDatasetError {
    /// Failed to create the parent directory for the database.
    #[error("failed to create parent directory for {path:?}")]
    CreateDirectory {
        /// Database path whose parent could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Destination database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Enabling SQLite foreign keys failed.
    #[error("failed to enable SQLite foreign keys")]
    ForeignKeys {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Beginning the transaction failed.
    #[error("failed to begin dataset import transaction")]
    BeginTransaction {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Creating the tables failed.
    #[error("failed to create schedule tables")]
    CreateSchema {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Preparing an upsert statement failed.
    #[error("failed to prepare {table} upsert statement")]
    PrepareInsert {
        /// Target table.
        table: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Writing a user row failed.
    #[error("failed to persist user {user_id}")]
    PersistUser {
        /// Id of the user being persisted.
        user_id: String,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Writing a schedule row failed, e.g. because the user is unknown.
    #[error("failed to persist schedule for user {user_id} on day {day}")]
    PersistSchedule {
        /// Owning user id.
        user_id: String,
        /// Weekday of the entry.
        day: DayOfWeek,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Committing the transaction failed.
    #[error("failed to commit dataset import transaction")]
    Commit {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
}

/// Persist `dataset` to the SQLite database at `path`.
///
/// The import is idempotent: rows with an existing key are updated in
/// place. Parent directories are created automatically and the tables are
/// initialised if missing. Either every record is written or none is.
///
/// # Errors
///
/// Returns [`PersistDatasetError`] naming the step and record that failed.
pub fn persist_dataset(path: &Utf8Path, dataset: &Dataset) -> Result<(), PersistDatasetError> {
    ensure_parent_dir(path).map_err(|source| PersistDatasetError::CreateDirectory {
        path: path.to_path_buf(),
        source,
    })?;
    let mut connection =
        Connection::open(path.as_std_path()).map_err(|source| PersistDatasetError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    write_dataset(&mut connection, dataset)
}

/// Write `dataset` through an open connection in one transaction.
pub(crate) fn write_dataset(
    connection: &mut Connection,
    dataset: &Dataset,
) -> Result<(), PersistDatasetError> {
    enable_foreign_keys(connection)
        .map_err(|source| PersistDatasetError::ForeignKeys { source })?;

    let transaction = connection
        .transaction()
        .map_err(|source| PersistDatasetError::BeginTransaction { source })?;

    create_schema(&transaction).map_err(|source| PersistDatasetError::CreateSchema { source })?;
    persist_users(&transaction, &dataset.users)?;
    persist_schedules(&transaction, &dataset.schedules)?;

    transaction
        .commit()
        .map_err(|source| PersistDatasetError::Commit { source })
}

fn persist_users(
    transaction: &Transaction<'_>,
    users: &[UserRecord],
) -> Result<(), PersistDatasetError> {
    if users.is_empty() {
        return Ok(());
    }

    let mut statement = transaction
        .prepare(
            "INSERT INTO users
                (id, name, photo_url, campus, home_area, home_lat, home_lng, role, time_zone, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                photo_url = excluded.photo_url,
                campus = excluded.campus,
                home_area = excluded.home_area,
                home_lat = excluded.home_lat,
                home_lng = excluded.home_lng,
                role = excluded.role,
                time_zone = excluded.time_zone,
                is_active = excluded.is_active",
        )
        .map_err(|source| PersistDatasetError::PrepareInsert {
            table: "users",
            source,
        })?;

    for user in users {
        let home = user.home();
        statement
            .execute((
                &user.id,
                &user.name,
                &user.photo_url,
                &user.campus,
                &user.home_area,
                home.map(|point| point.lat),
                home.map(|point| point.lng),
                user.role.as_str(),
                &user.time_zone,
                user.is_active,
            ))
            .map_err(|source| PersistDatasetError::PersistUser {
                user_id: user.id.clone(),
                source,
            })?;
    }

    Ok(())
}

fn persist_schedules(
    transaction: &Transaction<'_>,
    schedules: &[ScheduleRecord],
) -> Result<(), PersistDatasetError> {
    if schedules.is_empty() {
        return Ok(());
    }

    let mut statement = transaction
        .prepare(
            "INSERT INTO schedule_entries
                (user_id, day_of_week, to_campus_minutes, go_home_minutes,
                 to_campus_flex_minutes, go_home_flex_minutes,
                 to_campus_max_detour_minutes, go_home_max_detour_minutes, enabled)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT (user_id, day_of_week) DO UPDATE SET
                to_campus_minutes = excluded.to_campus_minutes,
                go_home_minutes = excluded.go_home_minutes,
                to_campus_flex_minutes = excluded.to_campus_flex_minutes,
                go_home_flex_minutes = excluded.go_home_flex_minutes,
                to_campus_max_detour_minutes = excluded.to_campus_max_detour_minutes,
                go_home_max_detour_minutes = excluded.go_home_max_detour_minutes,
                enabled = excluded.enabled",
        )
        .map_err(|source| PersistDatasetError::PrepareInsert {
            table: "schedule_entries",
            source,
        })?;

    for schedule in schedules {
        statement
            .execute((
                &schedule.user_id,
                schedule.day_of_week.get(),
                schedule.to_campus.minutes(),
                schedule.go_home.minutes(),
                schedule.to_campus_flex_minutes,
                schedule.go_home_flex_minutes,
                schedule.to_campus_max_detour_minutes,
                schedule.go_home_max_detour_minutes,
                schedule.enabled,
            ))
            .map_err(|source| PersistDatasetError::PersistSchedule {
                user_id: schedule.user_id.clone(),
                day: schedule.day_of_week,
                source,
            })?;
    }

    Ok(())
}

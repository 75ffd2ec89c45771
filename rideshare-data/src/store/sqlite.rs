//! SQLite-backed [`ScheduleStore`].
//!
//! Blocking `rusqlite` calls run on Tokio's blocking pool behind a shared
//! connection mutex, keeping async executors free.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use rideshare_core::{
    CandidateQuery, CandidateRow, CandidateUser, DayOfWeek, Direction, GeoCoordinate,
    RequesterProfile, Role, ScheduleEntry, ScheduleStore, StoreError, TimeOfDay,
};
use rusqlite::types::Value;
use rusqlite::{Connection, Error as SqliteError, OptionalExtension, Row, params_from_iter};
use thiserror::Error;

use super::dataset::{Dataset, PersistDatasetError, write_dataset};
use super::schema::{create_schema, enable_foreign_keys};

const USER_COLUMNS: &str =
    "u.id, u.name, u.photo_url, u.campus, u.home_area, u.home_lat, u.home_lng, u.role, u.time_zone";

const ENTRY_COLUMNS: &str = "s.user_id, s.day_of_week, s.to_campus_minutes, s.go_home_minutes, \
     s.to_campus_flex_minutes, s.go_home_flex_minutes, \
     s.to_campus_max_detour_minutes, s.go_home_max_detour_minutes, s.enabled";

/// Number of columns in [`USER_COLUMNS`].
const USER_COLUMN_COUNT: usize = 9;

/// Errors raised by [`SqliteScheduleStore`].
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Database path.
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
    /// Creating the tables failed.
    #[error("failed to create schedule tables")]
    CreateSchema {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A query failed.
    #[error("query failed")]
    Query {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A stored value is outside its domain.
    #[error("invalid {column} value in stored row: {message}")]
    InvalidRecord {
        /// Column holding the value.
        column: &'static str,
        /// Description of the problem.
        message: String,
    },
}

impl From<SqliteError> for SqliteStoreError {
    fn from(source: SqliteError) -> Self {
        Self::Query { source }
    }
}

/// Schedule store over a single SQLite connection.
///
/// Cloning shares the connection.
///
/// # Example
///
/// ```
/// use rideshare_core::ScheduleStore;
/// use rideshare_data::SqliteScheduleStore;
///
/// # tokio::runtime::Builder::new_current_thread().build()?.block_on(async {
/// let store = SqliteScheduleStore::in_memory()?;
/// assert!(store.find_requester("nobody").await?.is_none());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// # })?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct SqliteScheduleStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteScheduleStore {
    /// Open (or create) the database at `path` and ensure the tables exist.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] if the file cannot be opened or
    /// initialised.
    pub fn open(path: &Utf8Path) -> Result<Self, SqliteStoreError> {
        let connection =
            Connection::open(path.as_std_path()).map_err(|source| SqliteStoreError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_connection(connection)
    }

    /// Create an empty private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] if SQLite cannot be initialised.
    pub fn in_memory() -> Result<Self, SqliteStoreError> {
        let connection =
            Connection::open_in_memory().map_err(|source| SqliteStoreError::Open {
                path: Utf8PathBuf::from(":memory:"),
                source,
            })?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self, SqliteStoreError> {
        enable_foreign_keys(&connection)
            .map_err(|source| SqliteStoreError::ForeignKeys { source })?;
        create_schema(&connection).map_err(|source| SqliteStoreError::CreateSchema { source })?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Write `dataset` into this store in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`PersistDatasetError`] if any record fails to persist; no
    /// record is written in that case.
    pub fn import(&self, dataset: &Dataset) -> Result<(), PersistDatasetError> {
        let mut connection = self
            .connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        write_dataset(&mut connection, dataset)
    }

    /// Run `query` against the connection on the blocking pool.
    async fn run<T, F>(&self, operation: &'static str, query: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, SqliteStoreError> + Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        let result = tokio::task::spawn_blocking(move || {
            let guard = connection.lock().unwrap_or_else(PoisonError::into_inner);
            query(&guard)
        })
        .await
        .map_err(|err| StoreError::backend(operation, err))?;
        result.map_err(|err| match err {
            SqliteStoreError::InvalidRecord { .. } => StoreError::InvalidRecord {
                message: err.to_string(),
            },
            other => StoreError::backend(operation, other),
        })
    }
}

#[async_trait]
impl ScheduleStore for SqliteScheduleStore {
    async fn find_requester(&self, user_id: &str) -> Result<Option<RequesterProfile>, StoreError> {
        let user_id = user_id.to_owned();
        self.run("find_requester", move |connection| {
            connection
                .query_row(
                    "SELECT id, campus, home_area, home_lat, home_lng FROM users WHERE id = ?1",
                    [&user_id],
                    |row| {
                        Ok(RequesterProfile {
                            id: row.get(0)?,
                            campus: row.get(1)?,
                            home_area: row.get(2)?,
                            home: home(row.get(3)?, row.get(4)?),
                        })
                    },
                )
                .optional()
                .map_err(SqliteStoreError::from)
        })
        .await
    }

    async fn find_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<CandidateRow>, StoreError> {
        if query.roles.is_empty() {
            return Ok(Vec::new());
        }
        let (sql, params) = candidate_sql(query);
        self.run("find_candidates", move |connection| {
            let mut statement = connection.prepare(&sql)?;
            let raw = statement
                .query_map(params_from_iter(params), |row| {
                    Ok((RawUser::read(row, 0)?, RawEntry::read(row, USER_COLUMN_COUNT)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            raw.into_iter()
                .map(|(user, entry)| -> Result<CandidateRow, SqliteStoreError> {
                    Ok(CandidateRow {
                        candidate: user.into_candidate()?,
                        entry: entry.into_entry()?,
                    })
                })
                .collect()
        })
        .await
    }

    async fn find_active_driver(
        &self,
        user_id: &str,
    ) -> Result<Option<CandidateUser>, StoreError> {
        let user_id = user_id.to_owned();
        self.run("find_active_driver", move |connection| {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users u
                 WHERE u.id = ?1 AND u.is_active = 1 AND u.role IN ('DRIVER', 'BOTH')"
            );
            connection
                .query_row(&sql, [&user_id], |row| RawUser::read(row, 0))
                .optional()?
                .map(RawUser::into_candidate)
                .transpose()
        })
        .await
    }

    async fn find_enabled_entry(
        &self,
        user_id: &str,
        day: DayOfWeek,
    ) -> Result<Option<ScheduleEntry>, StoreError> {
        let user_id = user_id.to_owned();
        self.run("find_enabled_entry", move |connection| {
            let sql = format!(
                "SELECT {ENTRY_COLUMNS} FROM schedule_entries s
                 WHERE s.user_id = ?1 AND s.day_of_week = ?2 AND s.enabled = 1"
            );
            connection
                .query_row(&sql, (&user_id, day.get()), |row| RawEntry::read(row, 0))
                .optional()?
                .map(RawEntry::into_entry)
                .transpose()
        })
        .await
    }
}

/// Build the candidate query; the time column is chosen from a closed set.
fn candidate_sql(query: &CandidateQuery) -> (String, Vec<Value>) {
    let time_column = match query.direction {
        Direction::ToCampus => "s.to_campus_minutes",
        Direction::GoHome => "s.go_home_minutes",
    };
    let role_placeholders = (0..query.roles.len())
        .map(|index| format!("?{}", index + 6))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT {USER_COLUMNS}, {ENTRY_COLUMNS}
         FROM schedule_entries s JOIN users u ON u.id = s.user_id
         WHERE s.day_of_week = ?1
           AND s.enabled = 1
           AND u.is_active = 1
           AND u.campus = ?2
           AND u.id <> ?3
           AND {time_column} BETWEEN ?4 AND ?5
           AND u.role IN ({role_placeholders})
         ORDER BY {time_column}, s.rowid"
    );
    let mut params = vec![
        Value::Integer(i64::from(query.day.get())),
        Value::Text(query.campus.clone()),
        Value::Text(query.exclude_user_id.clone()),
        Value::Integer(i64::from(query.band.earliest)),
        Value::Integer(i64::from(query.band.latest)),
    ];
    params.extend(
        query
            .roles
            .iter()
            .map(|role| Value::Text(role.as_str().to_owned())),
    );
    (sql, params)
}

fn home(lat: Option<f64>, lng: Option<f64>) -> Option<GeoCoordinate> {
    lat.zip(lng).map(|(lat, lng)| GeoCoordinate::new(lat, lng))
}

/// User columns as stored.
#[derive(Debug)]
struct RawUser {
    id: String,
    name: String,
    photo_url: Option<String>,
    campus: String,
    home_area: Option<String>,
    home_lat: Option<f64>,
    home_lng: Option<f64>,
    role: String,
    time_zone: String,
}

impl RawUser {
    fn read(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(offset)?,
            name: row.get(offset + 1)?,
            photo_url: row.get(offset + 2)?,
            campus: row.get(offset + 3)?,
            home_area: row.get(offset + 4)?,
            home_lat: row.get(offset + 5)?,
            home_lng: row.get(offset + 6)?,
            role: row.get(offset + 7)?,
            time_zone: row.get(offset + 8)?,
        })
    }

    fn into_candidate(self) -> Result<CandidateUser, SqliteStoreError> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|err| invalid("role", &err))?;
        Ok(CandidateUser {
            id: self.id,
            name: self.name,
            photo_url: self.photo_url,
            campus: self.campus,
            home_area: self.home_area,
            home: home(self.home_lat, self.home_lng),
            role,
            time_zone: self.time_zone,
        })
    }
}

/// Schedule entry columns as stored.
#[derive(Debug)]
struct RawEntry {
    user_id: String,
    day_of_week: i64,
    to_campus_minutes: i64,
    go_home_minutes: i64,
    to_campus_flex_minutes: i64,
    go_home_flex_minutes: i64,
    to_campus_max_detour_minutes: i64,
    go_home_max_detour_minutes: i64,
    enabled: bool,
}

impl RawEntry {
    fn read(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(offset)?,
            day_of_week: row.get(offset + 1)?,
            to_campus_minutes: row.get(offset + 2)?,
            go_home_minutes: row.get(offset + 3)?,
            to_campus_flex_minutes: row.get(offset + 4)?,
            go_home_flex_minutes: row.get(offset + 5)?,
            to_campus_max_detour_minutes: row.get(offset + 6)?,
            go_home_max_detour_minutes: row.get(offset + 7)?,
            enabled: row.get(offset + 8)?,
        })
    }

    fn into_entry(self) -> Result<ScheduleEntry, SqliteStoreError> {
        Ok(ScheduleEntry {
            owner_user_id: self.user_id,
            day: DayOfWeek::new(self.day_of_week).map_err(|err| invalid("day_of_week", &err))?,
            to_campus: time_column("to_campus_minutes", self.to_campus_minutes)?,
            go_home: time_column("go_home_minutes", self.go_home_minutes)?,
            to_campus_flex_minutes: integer_column(
                "to_campus_flex_minutes",
                self.to_campus_flex_minutes,
            )?,
            go_home_flex_minutes: integer_column("go_home_flex_minutes", self.go_home_flex_minutes)?,
            to_campus_max_detour_minutes: integer_column(
                "to_campus_max_detour_minutes",
                self.to_campus_max_detour_minutes,
            )?,
            go_home_max_detour_minutes: integer_column(
                "go_home_max_detour_minutes",
                self.go_home_max_detour_minutes,
            )?,
            enabled: self.enabled,
        })
    }
}

fn time_column(column: &'static str, minutes: i64) -> Result<TimeOfDay, SqliteStoreError> {
    TimeOfDay::from_minutes(minutes).map_err(|err| invalid(column, &err))
}

fn integer_column<T: TryFrom<i64>>(column: &'static str, value: i64) -> Result<T, SqliteStoreError>
where
    T::Error: std::fmt::Display,
{
    T::try_from(value).map_err(|err| invalid(column, &err))
}

fn invalid(column: &'static str, err: &dyn std::fmt::Display) -> SqliteStoreError {
    SqliteStoreError::InvalidRecord {
        column,
        message: err.to_string(),
    }
}

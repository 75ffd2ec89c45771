//! SQLite schema shared by the schedule store and the dataset importer.

use rusqlite::Connection;

/// Tables for users and their weekly schedule entries.
///
/// Times are minutes after midnight. The composite primary key keeps at most
/// one entry per user and weekday.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    photo_url TEXT,
    campus TEXT NOT NULL,
    home_area TEXT,
    home_lat REAL,
    home_lng REAL,
    role TEXT NOT NULL CHECK (role IN ('DRIVER', 'PASSENGER', 'BOTH')),
    time_zone TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1
);
CREATE TABLE IF NOT EXISTS schedule_entries (
    user_id TEXT NOT NULL REFERENCES users (id),
    day_of_week INTEGER NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
    to_campus_minutes INTEGER NOT NULL CHECK (to_campus_minutes BETWEEN 0 AND 1439),
    go_home_minutes INTEGER NOT NULL CHECK (go_home_minutes BETWEEN 0 AND 1439),
    to_campus_flex_minutes INTEGER NOT NULL DEFAULT 15,
    go_home_flex_minutes INTEGER NOT NULL DEFAULT 15,
    to_campus_max_detour_minutes INTEGER NOT NULL DEFAULT 10,
    go_home_max_detour_minutes INTEGER NOT NULL DEFAULT 10,
    enabled INTEGER NOT NULL DEFAULT 1,
    PRIMARY KEY (user_id, day_of_week)
);
CREATE INDEX IF NOT EXISTS schedule_entries_by_day ON schedule_entries (day_of_week, enabled);
";

/// Create the tables and indexes if they are missing.
pub(crate) fn create_schema(connection: &Connection) -> rusqlite::Result<()> {
    connection.execute_batch(SCHEMA)
}

/// Enable foreign-key enforcement for `connection`.
pub(crate) fn enable_foreign_keys(connection: &Connection) -> rusqlite::Result<()> {
    connection.pragma_update(None, "foreign_keys", true)
}

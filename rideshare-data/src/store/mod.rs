//! Persistence for users and weekly schedules.
//!
//! [`SqliteScheduleStore`] implements [`rideshare_core::ScheduleStore`];
//! [`persist_dataset`] loads a JSON [`Dataset`] into the same schema.

mod dataset;
mod schema;
mod sqlite;

pub use dataset::{
    Dataset, LoadDatasetError, PersistDatasetError, ScheduleRecord, UserRecord, load_dataset,
    persist_dataset,
};
pub use sqlite::{SqliteScheduleStore, SqliteStoreError};

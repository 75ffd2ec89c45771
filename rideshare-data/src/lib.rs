//! Adapters for the campus rideshare matcher.
//!
//! Responsibilities:
//! - Implement [`rideshare_core::RoutingProvider`] over the Google Maps web
//!   services, with response caching.
//! - Implement [`rideshare_core::ScheduleStore`] over SQLite and import JSON
//!   datasets into it.
//!
//! Boundaries:
//! - Do not encode matching rules (live in `rideshare-core`).
//! - Keep blocking I/O off async executors.
//!
//! Invariants:
//! - Errors never carry the mapping API key.
//! - No global mutable state.

mod fs;
pub mod routing;
pub mod store;

pub use routing::{MapsApiConfig, MapsRoutingProvider, ProviderBuildError};
pub use store::{
    Dataset, LoadDatasetError, PersistDatasetError, ScheduleRecord, SqliteScheduleStore,
    SqliteStoreError, UserRecord, load_dataset, persist_dataset,
};

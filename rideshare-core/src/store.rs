//! Read access to users and schedules.
//!
//! The core never owns persistence. Matching and availability lookups go
//! through [`ScheduleStore`], which the data crate implements over SQLite and
//! [`crate::test_support`] implements in memory.

use std::error::Error as StdError;

use async_trait::async_trait;
use thiserror::Error;

use crate::{CandidateQuery, CandidateRow, CandidateUser, DayOfWeek, RequesterProfile, ScheduleEntry};

/// Errors raised by [`ScheduleStore`] implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store failed.
    #[error("schedule store failed during {operation}: {source}")]
    Backend {
        /// Operation that was running.
        operation: &'static str,
        /// Underlying failure.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    /// A stored record could not be turned into a domain value.
    #[error("invalid stored record: {message}")]
    InvalidRecord {
        /// Description of the problem.
        message: String,
    },
}

impl StoreError {
    /// Wrap a backend failure.
    pub fn backend<E>(operation: &'static str, source: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self::Backend {
            operation,
            source: source.into(),
        }
    }
}

/// Query interface over users and their weekly schedule entries.
///
/// Implementations must be safe to share across tasks.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Load the requester's campus and home details.
    ///
    /// Returns `Ok(None)` when no user has the id.
    async fn find_requester(&self, user_id: &str) -> Result<Option<RequesterProfile>, StoreError>;

    /// Return candidate rows admitted by `query`, ordered by the query's
    /// time field ascending.
    ///
    /// Only active users with enabled entries are returned.
    async fn find_candidates(&self, query: &CandidateQuery)
    -> Result<Vec<CandidateRow>, StoreError>;

    /// Load an active user whose role can drive.
    ///
    /// Returns `Ok(None)` for unknown, inactive or passenger-only users.
    async fn find_active_driver(&self, user_id: &str)
    -> Result<Option<CandidateUser>, StoreError>;

    /// Load the user's enabled entry for `day`, if any.
    async fn find_enabled_entry(
        &self,
        user_id: &str,
        day: DayOfWeek,
    ) -> Result<Option<ScheduleEntry>, StoreError>;
}

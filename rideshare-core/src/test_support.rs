//! Deterministic in-memory doubles for [`ScheduleStore`] and
//! [`RoutingProvider`], used by unit tests, behaviour tests and benchmarks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    CandidateQuery, CandidateRow, CandidateUser, DayOfWeek, DetourQuote, GeoCoordinate, Location,
    PlaceDetails, PlaceSuggestion, RequesterProfile, Role, RoutingError, RoutingProvider,
    ScheduleEntry, ScheduleStore, StoreError, TimeOfDay,
};

/// Build a candidate profile with neutral defaults for the optional fields.
#[must_use]
pub fn sample_user(id: &str, campus: &str, role: Role, home: Option<GeoCoordinate>) -> CandidateUser {
    CandidateUser {
        id: id.to_owned(),
        name: format!("User {id}"),
        photo_url: None,
        campus: campus.to_owned(),
        home_area: None,
        home,
        role,
        time_zone: "America/Vancouver".to_owned(),
    }
}

/// Build an enabled entry with 15 minutes of flexibility and a 10 minute
/// detour budget in both directions.
#[must_use]
pub fn sample_entry(
    owner: &str,
    day: DayOfWeek,
    to_campus: TimeOfDay,
    go_home: TimeOfDay,
) -> ScheduleEntry {
    ScheduleEntry {
        owner_user_id: owner.to_owned(),
        day,
        to_campus,
        go_home,
        to_campus_flex_minutes: 15,
        go_home_flex_minutes: 15,
        to_campus_max_detour_minutes: 10,
        go_home_max_detour_minutes: 10,
        enabled: true,
    }
}

#[derive(Debug, Clone)]
struct StoredUser {
    profile: CandidateUser,
    active: bool,
}

/// In-memory [`ScheduleStore`].
///
/// Candidate queries perform a linear scan and sort by the requested time
/// field, keeping insertion order for ties.
#[derive(Debug, Clone, Default)]
pub struct MemoryScheduleStore {
    users: Vec<StoredUser>,
    entries: Vec<ScheduleEntry>,
    ignore_filters: bool,
}

impl MemoryScheduleStore {
    /// Add an active user.
    #[must_use]
    pub fn with_user(mut self, profile: CandidateUser) -> Self {
        self.users.push(StoredUser {
            profile,
            active: true,
        });
        self
    }

    /// Add a deactivated user.
    #[must_use]
    pub fn with_inactive_user(mut self, profile: CandidateUser) -> Self {
        self.users.push(StoredUser {
            profile,
            active: false,
        });
        self
    }

    /// Add a schedule entry, replacing any entry for the same owner and day.
    #[must_use]
    pub fn with_entry(mut self, entry: ScheduleEntry) -> Self {
        self.entries
            .retain(|e| !(e.owner_user_id == entry.owner_user_id && e.day == entry.day));
        self.entries.push(entry);
        self
    }

    /// Return every joined row from `find_candidates`, ignoring the query.
    ///
    /// Simulates a store that does not honour its filter contract.
    #[must_use]
    pub fn ignoring_filters(mut self) -> Self {
        self.ignore_filters = true;
        self
    }

    fn user(&self, id: &str) -> Option<&StoredUser> {
        self.users.iter().find(|u| u.profile.id == id)
    }
}

#[async_trait]
impl ScheduleStore for MemoryScheduleStore {
    async fn find_requester(&self, user_id: &str) -> Result<Option<RequesterProfile>, StoreError> {
        Ok(self.user(user_id).map(|u| RequesterProfile {
            id: u.profile.id.clone(),
            campus: u.profile.campus.clone(),
            home_area: u.profile.home_area.clone(),
            home: u.profile.home,
        }))
    }

    async fn find_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<CandidateRow>, StoreError> {
        let mut rows: Vec<CandidateRow> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let user = self.user(&entry.owner_user_id)?;
                let row = CandidateRow {
                    candidate: user.profile.clone(),
                    entry: entry.clone(),
                };
                (self.ignore_filters || (user.active && query.admits(&row))).then_some(row)
            })
            .collect();
        if !self.ignore_filters {
            rows.sort_by_key(|row| row.entry.time_for(query.direction));
        }
        Ok(rows)
    }

    async fn find_active_driver(
        &self,
        user_id: &str,
    ) -> Result<Option<CandidateUser>, StoreError> {
        Ok(self
            .user(user_id)
            .filter(|u| u.active && u.profile.role.can_drive())
            .map(|u| u.profile.clone()))
    }

    async fn find_enabled_entry(
        &self,
        user_id: &str,
        day: DayOfWeek,
    ) -> Result<Option<ScheduleEntry>, StoreError> {
        Ok(self
            .entries
            .iter()
            .find(|e| e.owner_user_id == user_id && e.day == day && e.enabled)
            .cloned())
    }
}

/// [`RoutingProvider`] returning canned detour quotes keyed by driver origin.
///
/// Origins without a canned response fail with a `Status` error. Every
/// detour request is recorded so tests can assert on call counts and
/// argument order.
#[derive(Debug, Default)]
pub struct StubRoutingProvider {
    responses: HashMap<String, Result<DetourQuote, RoutingError>>,
    delay: Option<Duration>,
    requests: Mutex<Vec<[String; 3]>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl StubRoutingProvider {
    /// Answer detours from `origin` with `quote`.
    #[must_use]
    pub fn with_quote(mut self, origin: GeoCoordinate, quote: DetourQuote) -> Self {
        self.responses
            .insert(Location::from(origin).to_string(), Ok(quote));
        self
    }

    /// Answer detours from `origin` with `error`.
    #[must_use]
    pub fn with_error(mut self, origin: GeoCoordinate, error: RoutingError) -> Self {
        self.responses
            .insert(Location::from(origin).to_string(), Err(error));
        self
    }

    /// Sleep for `delay` before answering each detour request.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Recorded `[origin, stop, destination]` triples in call order.
    pub fn requests(&self) -> Vec<[String; 3]> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of detour requests received.
    pub fn calls(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Highest number of detour requests observed in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoutingProvider for StubRoutingProvider {
    async fn autocomplete(
        &self,
        _query: &str,
        _limit: usize,
    ) -> Result<Vec<PlaceSuggestion>, RoutingError> {
        Ok(Vec::new())
    }

    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, RoutingError> {
        Err(RoutingError::PlaceNotFound {
            place_id: place_id.to_owned(),
        })
    }

    async fn route_duration_minutes(
        &self,
        _origin: &Location,
        _destination: &Location,
    ) -> Result<u32, RoutingError> {
        Ok(0)
    }

    async fn detour_extra_minutes(
        &self,
        driver_origin: &Location,
        passenger_stop: &Location,
        destination: &Location,
    ) -> Result<DetourQuote, RoutingError> {
        let origin = driver_origin.to_string();
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push([
                origin.clone(),
                passenger_stop.to_string(),
                destination.to_string(),
            ]);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.responses.get(&origin).cloned().unwrap_or_else(|| {
            Err(RoutingError::Status {
                endpoint: "stub",
                status: "NO_CANNED_RESPONSE".to_owned(),
                message: Some(origin),
            })
        })
    }
}

//! Find and rank commute partners for a requester.
//!
//! [`MatchEngine::find_matches`] filters a day's schedules by campus, role
//! and time band, then ranks survivors. When the requester's home is known
//! each candidate is quoted a detour through the requester's home on the way
//! to campus, candidates over their own detour budget are dropped, and the
//! rest are ordered by extra minutes then time difference. Without a home the
//! engine falls back to time-only ranking and says so in the outcome.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    CampusRegistry, CandidateQuery, CandidateRow, CandidateUser, DayOfWeek, DetourQuote,
    Direction, GeoCoordinate, Location, RoleGroup, RoutingError, RoutingProvider, ScheduleEntry,
    ScheduleStore, StoreError, TimeBand, TimeError, TimeOfDay, UnknownCampus, parse_time_of_day,
    try_map_with_concurrency,
};

#[cfg(test)]
mod tests;

/// Note attached to time-only outcomes.
pub const DEGRADED_NOTE: &str = "Geo filtering skipped: requester home location missing.";

/// Default cap on simultaneous detour lookups.
pub const DEFAULT_DETOUR_CONCURRENCY: usize = 5;

/// What to do when a single candidate's detour lookup fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoutingFailurePolicy {
    /// Fail the whole match with the routing error.
    #[default]
    Abort,
    /// Log the failure and leave the candidate out.
    SkipCandidate,
}

/// Tuning for [`MatchEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchEngineConfig {
    /// Maximum detour lookups in flight at once.
    pub detour_concurrency: usize,
    /// Upper bound on each detour lookup. `None` waits indefinitely.
    pub routing_timeout: Option<Duration>,
    /// Handling of per-candidate routing failures.
    pub routing_failure: RoutingFailurePolicy,
}

impl Default for MatchEngineConfig {
    fn default() -> Self {
        Self {
            detour_concurrency: DEFAULT_DETOUR_CONCURRENCY,
            routing_timeout: None,
            routing_failure: RoutingFailurePolicy::Abort,
        }
    }
}

impl MatchEngineConfig {
    /// Set the detour lookup concurrency. Zero is treated as one.
    #[must_use]
    pub fn with_detour_concurrency(mut self, limit: usize) -> Self {
        self.detour_concurrency = limit;
        self
    }

    /// Bound each detour lookup.
    #[must_use]
    pub fn with_routing_timeout(mut self, timeout: Duration) -> Self {
        self.routing_timeout = Some(timeout);
        self
    }

    /// Choose the per-candidate failure policy.
    #[must_use]
    pub fn with_routing_failure(mut self, policy: RoutingFailurePolicy) -> Self {
        self.routing_failure = policy;
        self
    }
}

/// Parameters of a single match search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRequest {
    /// The user searching for partners.
    pub requester_id: String,
    /// Weekday to match on.
    pub day: DayOfWeek,
    /// Commute leg to match on.
    pub direction: Direction,
    /// Desired departure as `HH:MM`.
    pub target_time: String,
    /// Accepted distance from `target_time`, in minutes, either side.
    pub flexibility_minutes: u16,
    /// Which counterpart role to look for.
    pub role_group: RoleGroup,
}

/// Time-based score shared by every match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchScore {
    /// `|candidate time - target time|` for the requested direction.
    pub time_difference_minutes: u16,
    /// The requested time.
    pub target_time: TimeOfDay,
    /// Candidate's to-campus departure.
    pub to_campus: TimeOfDay,
    /// Candidate's go-home departure.
    pub go_home: TimeOfDay,
}

impl MatchScore {
    fn new(entry: &ScheduleEntry, target: TimeOfDay, direction: Direction) -> Self {
        Self {
            time_difference_minutes: entry.time_for(direction).abs_diff(target),
            target_time: target,
            to_campus: entry.to_campus,
            go_home: entry.go_home,
        }
    }
}

/// A candidate ranked on time alone.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeMatch {
    /// The candidate's profile.
    pub candidate: CandidateUser,
    /// The candidate's entry for the requested day.
    pub entry: ScheduleEntry,
    /// Time score.
    pub score: MatchScore,
}

/// A candidate ranked on detour cost and time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetourMatch {
    /// The candidate's profile.
    pub candidate: CandidateUser,
    /// The candidate's entry for the requested day.
    pub entry: ScheduleEntry,
    /// Time score.
    pub score: MatchScore,
    /// Cost of the candidate's detour through the requester's home.
    pub detour: DetourQuote,
}

/// Ranked results of [`MatchEngine::find_matches`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "mode", rename_all = "snake_case")
)]
pub enum MatchOutcome {
    /// Geo-filtered results ordered by extra minutes then time difference.
    Detour {
        /// Surviving candidates.
        matches: Vec<DetourMatch>,
    },
    /// Results ordered by time difference only.
    TimeOnly {
        /// Every time-compatible candidate.
        matches: Vec<TimeMatch>,
        /// Why detour filtering was skipped.
        note: String,
    },
}

impl MatchOutcome {
    /// The degraded-mode note, present only for time-only outcomes.
    #[must_use]
    pub fn degraded_note(&self) -> Option<&str> {
        match self {
            Self::Detour { .. } => None,
            Self::TimeOnly { note, .. } => Some(note),
        }
    }

    /// Number of matches.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Detour { matches } => matches.len(),
            Self::TimeOnly { matches, .. } => matches.len(),
        }
    }

    /// Whether no candidate matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Candidate ids in rank order.
    #[must_use]
    pub fn candidate_ids(&self) -> Vec<&str> {
        match self {
            Self::Detour { matches } => matches.iter().map(|m| m.candidate.id.as_str()).collect(),
            Self::TimeOnly { matches, .. } => {
                matches.iter().map(|m| m.candidate.id.as_str()).collect()
            }
        }
    }
}

/// Errors from [`MatchEngine::find_matches`].
#[derive(Debug, Error)]
pub enum MatchError {
    /// The target time was not `HH:MM`.
    #[error(transparent)]
    InvalidTime(#[from] TimeError),
    /// The requester does not exist.
    #[error("user {user_id:?} not found")]
    UserNotFound {
        /// The requested id.
        user_id: String,
    },
    /// The requester's campus is not registered.
    #[error(transparent)]
    UnknownCampus(#[from] UnknownCampus),
    /// The schedule store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A detour lookup failed.
    #[error("detour lookup for candidate {candidate_id:?} failed: {source}")]
    Routing {
        /// Candidate whose lookup failed.
        candidate_id: String,
        /// Provider error.
        #[source]
        source: RoutingError,
    },
    /// A detour lookup exceeded the configured timeout.
    #[error("detour lookup for candidate {candidate_id:?} timed out after {timeout:?}")]
    RoutingTimeout {
        /// Candidate whose lookup timed out.
        candidate_id: String,
        /// The configured bound.
        timeout: Duration,
    },
}

/// Orchestrates candidate lookup, detour quoting and ranking.
///
/// The engine holds shared handles to its collaborators and can serve
/// concurrent requests.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use rideshare_core::test_support::MemoryScheduleStore;
/// use rideshare_core::{EstimatorRoutingProvider, MatchEngine};
///
/// let engine = MatchEngine::new(
///     Arc::new(MemoryScheduleStore::default()),
///     Arc::new(EstimatorRoutingProvider::new()),
/// );
/// assert_eq!(engine.config().detour_concurrency, 5);
/// ```
#[derive(Clone)]
pub struct MatchEngine {
    store: Arc<dyn ScheduleStore>,
    routing: Arc<dyn RoutingProvider>,
    campuses: CampusRegistry,
    config: MatchEngineConfig,
}

impl std::fmt::Debug for MatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchEngine")
            .field("store", &"<dyn ScheduleStore>")
            .field("routing", &"<dyn RoutingProvider>")
            .field("campuses", &self.campuses)
            .field("config", &self.config)
            .finish()
    }
}

impl MatchEngine {
    /// Create an engine with the default campus registry and configuration.
    pub fn new(store: Arc<dyn ScheduleStore>, routing: Arc<dyn RoutingProvider>) -> Self {
        Self {
            store,
            routing,
            campuses: CampusRegistry::default(),
            config: MatchEngineConfig::default(),
        }
    }

    /// Replace the campus registry.
    #[must_use]
    pub fn with_campuses(mut self, campuses: CampusRegistry) -> Self {
        self.campuses = campuses;
        self
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: MatchEngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &MatchEngineConfig {
        &self.config
    }

    /// Registered campuses.
    #[must_use]
    pub fn campuses(&self) -> &CampusRegistry {
        &self.campuses
    }

    /// Find and rank partners for `request`.
    ///
    /// # Errors
    ///
    /// - [`MatchError::InvalidTime`] when `target_time` is malformed.
    /// - [`MatchError::UserNotFound`] when the requester is unknown.
    /// - [`MatchError::UnknownCampus`] when the requester's campus is not
    ///   registered.
    /// - [`MatchError::Store`] when candidate lookup fails.
    /// - [`MatchError::Routing`] or [`MatchError::RoutingTimeout`] when a
    ///   detour lookup fails under [`RoutingFailurePolicy::Abort`].
    pub async fn find_matches(&self, request: &MatchRequest) -> Result<MatchOutcome, MatchError> {
        let target = parse_time_of_day(&request.target_time)?;
        let requester = self
            .store
            .find_requester(&request.requester_id)
            .await?
            .ok_or_else(|| MatchError::UserNotFound {
                user_id: request.requester_id.clone(),
            })?;
        let campus = self.campuses.resolve(&requester.campus)?;

        let query = CandidateQuery {
            day: request.day,
            campus: requester.campus,
            exclude_user_id: request.requester_id.clone(),
            roles: request.role_group.roles().to_vec(),
            direction: request.direction,
            band: TimeBand::around(target, request.flexibility_minutes),
        };
        let rows = self.store.find_candidates(&query).await?;
        let fetched = rows.len();
        let scored: Vec<TimeMatch> = rows
            .into_iter()
            .filter(|row| admitted(&query, row))
            .map(|row| TimeMatch {
                score: MatchScore::new(&row.entry, target, request.direction),
                candidate: row.candidate,
                entry: row.entry,
            })
            .collect();

        let Some(home) = requester.home else {
            let mut matches = scored;
            matches.sort_by_key(|m| m.score.time_difference_minutes);
            info!(
                "time-only match for {}: {} of {fetched} candidates kept",
                request.requester_id,
                matches.len()
            );
            return Ok(MatchOutcome::TimeOnly {
                matches,
                note: DEGRADED_NOTE.to_owned(),
            });
        };

        let matches = self
            .rank_by_detour(scored, home, campus, request.direction)
            .await?;
        info!(
            "detour match for {}: {} of {fetched} candidates kept",
            request.requester_id,
            matches.len()
        );
        Ok(MatchOutcome::Detour { matches })
    }

    async fn rank_by_detour(
        &self,
        scored: Vec<TimeMatch>,
        requester_home: GeoCoordinate,
        campus: GeoCoordinate,
        direction: Direction,
    ) -> Result<Vec<DetourMatch>, MatchError> {
        let located: Vec<(TimeMatch, GeoCoordinate)> = scored
            .into_iter()
            .filter_map(|m| match m.candidate.home {
                Some(home) => Some((m, home)),
                None => {
                    debug!("dropping candidate {}: home location unknown", m.candidate.id);
                    None
                }
            })
            .collect();

        let stop = Location::from(requester_home);
        let destination = Location::from(campus);
        let (stop, destination) = (&stop, &destination);
        let quoted = try_map_with_concurrency(
            located,
            self.config.detour_concurrency,
            |(m, home)| async move {
                let quote = self
                    .quote_detour(&m.candidate.id, &Location::from(home), stop, destination)
                    .await?;
                Ok::<_, MatchError>((m, quote))
            },
        )
        .await?;

        let mut matches: Vec<DetourMatch> = quoted
            .into_iter()
            .filter_map(|(m, quote)| {
                let detour = quote?;
                let budget = m.entry.max_detour_for(direction);
                if detour.extra_minutes > budget {
                    debug!(
                        "dropping candidate {}: detour {} min exceeds budget {budget} min",
                        m.candidate.id, detour.extra_minutes
                    );
                    return None;
                }
                Some(DetourMatch {
                    candidate: m.candidate,
                    entry: m.entry,
                    score: m.score,
                    detour,
                })
            })
            .collect();
        matches.sort_by_key(|m| (m.detour.extra_minutes, m.score.time_difference_minutes));
        Ok(matches)
    }

    /// Quote one candidate, applying the timeout and failure policy.
    ///
    /// `Ok(None)` means the candidate was skipped.
    async fn quote_detour(
        &self,
        candidate_id: &str,
        origin: &Location,
        stop: &Location,
        destination: &Location,
    ) -> Result<Option<DetourQuote>, MatchError> {
        let lookup = self.routing.detour_extra_minutes(origin, stop, destination);
        let result = match self.config.routing_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, lookup).await {
                Ok(result) => result.map_err(|source| routing_error(candidate_id, source)),
                Err(_) => Err(MatchError::RoutingTimeout {
                    candidate_id: candidate_id.to_owned(),
                    timeout,
                }),
            },
            None => lookup
                .await
                .map_err(|source| routing_error(candidate_id, source)),
        };
        match (result, self.config.routing_failure) {
            (Ok(quote), _) => Ok(Some(quote)),
            (Err(err), RoutingFailurePolicy::SkipCandidate) => {
                warn!("skipping candidate {candidate_id}: {err}");
                Ok(None)
            }
            (Err(err), RoutingFailurePolicy::Abort) => Err(err),
        }
    }
}

fn routing_error(candidate_id: &str, source: RoutingError) -> MatchError {
    MatchError::Routing {
        candidate_id: candidate_id.to_owned(),
        source,
    }
}

/// Re-check a store row against the query it was fetched with.
fn admitted(query: &CandidateQuery, row: &CandidateRow) -> bool {
    let ok = query.admits(row);
    if !ok {
        warn!(
            "schedule store returned candidate {} outside the query filter; ignoring",
            row.candidate.id
        );
    }
    ok
}

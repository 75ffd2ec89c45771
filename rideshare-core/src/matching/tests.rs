//! Unit tests for [`MatchEngine`].

use super::*;
use crate::test_support::{MemoryScheduleStore, StubRoutingProvider, sample_entry, sample_user};
use crate::{EstimatorRoutingProvider, Role};
use rstest::{fixture, rstest};

const CAMPUS: GeoCoordinate = GeoCoordinate::new(49.2606, -123.2460);
const REQUESTER_HOME: GeoCoordinate = GeoCoordinate::new(49.30, -123.10);

fn at(minutes: i64) -> TimeOfDay {
    TimeOfDay::from_minutes(minutes).expect("in range")
}

fn monday() -> DayOfWeek {
    DayOfWeek::new(1).expect("valid day")
}

fn home(n: u32) -> GeoCoordinate {
    GeoCoordinate::new(49.20 + f64::from(n) * 0.01, -123.15)
}

fn driver(id: &str, home: Option<GeoCoordinate>) -> CandidateUser {
    sample_user(id, "Main Campus", Role::Driver, home)
}

fn entry(owner: &str, to_campus: i64) -> ScheduleEntry {
    sample_entry(owner, monday(), at(to_campus), at(1020))
}

fn request(time: &str) -> MatchRequest {
    MatchRequest {
        requester_id: "req".into(),
        day: monday(),
        direction: Direction::ToCampus,
        target_time: time.into(),
        flexibility_minutes: 15,
        role_group: RoleGroup::Driver,
    }
}

fn quote(extra: u32) -> DetourQuote {
    DetourQuote::new(20, 20 + extra)
}

#[fixture]
fn located_requester() -> MemoryScheduleStore {
    MemoryScheduleStore::default().with_user(sample_user(
        "req",
        "Main Campus",
        Role::Passenger,
        Some(REQUESTER_HOME),
    ))
}

#[fixture]
fn homeless_requester() -> MemoryScheduleStore {
    MemoryScheduleStore::default().with_user(sample_user(
        "req",
        "Main Campus",
        Role::Passenger,
        None,
    ))
}

fn engine(store: MemoryScheduleStore, routing: Arc<dyn RoutingProvider>) -> MatchEngine {
    MatchEngine::new(Arc::new(store), routing)
}

#[rstest]
#[tokio::test]
async fn end_to_end_with_estimator(located_requester: MemoryScheduleStore) {
    let mut near = entry("d1", 520);
    near.to_campus_max_detour_minutes = 30;
    let store = located_requester
        .with_user(driver("d1", Some(GeoCoordinate::new(49.29, -123.12))))
        .with_user(driver("d2", Some(GeoCoordinate::new(49.29, -123.12))))
        .with_entry(near)
        .with_entry(entry("d2", 600));
    let outcome = engine(store, Arc::new(EstimatorRoutingProvider::new()))
        .find_matches(&request("08:30"))
        .await
        .expect("match");

    let MatchOutcome::Detour { matches } = outcome else {
        panic!("expected detour outcome");
    };
    assert_eq!(matches.len(), 1);
    let only = &matches[0];
    assert_eq!(only.candidate.id, "d1");
    assert_eq!(only.score.time_difference_minutes, 10);
    assert_eq!(only.score.to_campus.to_string(), "08:40");
    assert_eq!(only.score.target_time.to_string(), "08:30");
    assert_eq!(
        only.detour.extra_minutes,
        only.detour.via_minutes.saturating_sub(only.detour.base_minutes)
    );
}

#[rstest]
#[tokio::test]
async fn malformed_time_is_rejected(located_requester: MemoryScheduleStore) {
    let err = engine(located_requester, Arc::new(StubRoutingProvider::default()))
        .find_matches(&request("8:5"))
        .await
        .expect_err("bad time");
    assert!(matches!(err, MatchError::InvalidTime(TimeError::InvalidFormat { .. })));
}

#[rstest]
#[tokio::test]
async fn unknown_requester_is_not_found() {
    let err = engine(
        MemoryScheduleStore::default(),
        Arc::new(StubRoutingProvider::default()),
    )
    .find_matches(&request("08:30"))
    .await
    .expect_err("no requester");
    assert!(matches!(err, MatchError::UserNotFound { ref user_id } if user_id == "req"));
}

#[rstest]
#[tokio::test]
async fn unregistered_campus_lists_valid_names() {
    let store = MemoryScheduleStore::default().with_user(sample_user(
        "req",
        "Nowhere U",
        Role::Passenger,
        Some(REQUESTER_HOME),
    ));
    let err = engine(store, Arc::new(StubRoutingProvider::default()))
        .find_matches(&request("08:30"))
        .await
        .expect_err("unknown campus");
    let MatchError::UnknownCampus(campus) = err else {
        panic!("expected UnknownCampus, got {err:?}");
    };
    assert_eq!(campus.name, "Nowhere U");
    assert_eq!(campus.known, ["Main Campus", "UBC Campus", "North Campus"]);
}

#[rstest]
#[tokio::test]
async fn time_band_is_inclusive(homeless_requester: MemoryScheduleStore) {
    let store = homeless_requester
        .with_user(driver("early-edge", None))
        .with_user(driver("late-edge", None))
        .with_user(driver("too-early", None))
        .with_user(driver("too-late", None))
        .with_entry(entry("early-edge", 495))
        .with_entry(entry("late-edge", 525))
        .with_entry(entry("too-early", 494))
        .with_entry(entry("too-late", 526));
    let outcome = engine(store, Arc::new(StubRoutingProvider::default()))
        .find_matches(&request("08:30"))
        .await
        .expect("match");
    let mut ids = outcome.candidate_ids();
    ids.sort_unstable();
    assert_eq!(ids, ["early-edge", "late-edge"]);
}

#[rstest]
#[tokio::test]
async fn requester_never_matches_themselves() {
    let store = MemoryScheduleStore::default()
        .with_user(sample_user("req", "Main Campus", Role::Both, None))
        .with_user(driver("d1", None))
        .with_entry(entry("req", 510))
        .with_entry(entry("d1", 515));
    let outcome = engine(store, Arc::new(StubRoutingProvider::default()))
        .find_matches(&request("08:30"))
        .await
        .expect("match");
    assert_eq!(outcome.candidate_ids(), ["d1"]);
}

#[rstest]
#[tokio::test]
async fn degraded_mode_sorts_by_time_difference(homeless_requester: MemoryScheduleStore) {
    let store = homeless_requester
        .with_user(driver("far", Some(home(1))))
        .with_user(driver("close", None))
        .with_user(driver("mid", Some(home(2))))
        .with_entry(entry("far", 524))
        .with_entry(entry("close", 508))
        .with_entry(entry("mid", 500));
    let routing = Arc::new(StubRoutingProvider::default());
    let outcome = engine(store, routing.clone())
        .find_matches(&request("08:30"))
        .await
        .expect("match");
    assert_eq!(outcome.degraded_note(), Some(DEGRADED_NOTE));
    assert_eq!(outcome.candidate_ids(), ["close", "mid", "far"]);
    assert_eq!(routing.calls(), 0);
}

#[rstest]
#[tokio::test]
async fn full_path_orders_by_detour_then_time(located_requester: MemoryScheduleStore) {
    let store = located_requester
        .with_user(driver("a", Some(home(1))))
        .with_user(driver("b", Some(home(2))))
        .with_user(driver("c", Some(home(3))))
        .with_entry(entry("a", 520))
        .with_entry(entry("b", 512))
        .with_entry(entry("c", 524));
    let routing = StubRoutingProvider::default()
        .with_quote(home(1), quote(3))
        .with_quote(home(2), quote(3))
        .with_quote(home(3), quote(1));
    let outcome = engine(store, Arc::new(routing))
        .find_matches(&request("08:30"))
        .await
        .expect("match");
    assert_eq!(outcome.degraded_note(), None);
    assert_eq!(outcome.candidate_ids(), ["c", "b", "a"]);
}

#[rstest]
#[tokio::test]
async fn detour_budget_is_per_candidate(located_requester: MemoryScheduleStore) {
    let mut generous = entry("generous", 510);
    generous.to_campus_max_detour_minutes = 20;
    let store = located_requester
        .with_user(driver("at-limit", Some(home(1))))
        .with_user(driver("over", Some(home(2))))
        .with_user(driver("generous", Some(home(3))))
        .with_entry(entry("at-limit", 510))
        .with_entry(entry("over", 510))
        .with_entry(generous);
    let routing = StubRoutingProvider::default()
        .with_quote(home(1), quote(10))
        .with_quote(home(2), quote(11))
        .with_quote(home(3), quote(15));
    let outcome = engine(store, Arc::new(routing))
        .find_matches(&request("08:30"))
        .await
        .expect("match");
    assert_eq!(outcome.candidate_ids(), ["at-limit", "generous"]);
}

#[rstest]
#[tokio::test]
async fn go_home_uses_its_own_time_and_budget(located_requester: MemoryScheduleStore) {
    let mut tight = sample_entry("tight", monday(), at(480), at(1020));
    tight.go_home_max_detour_minutes = 2;
    let store = located_requester
        .with_user(driver("tight", Some(home(1))))
        .with_user(driver("easy", Some(home(2))))
        .with_entry(tight)
        .with_entry(sample_entry("easy", monday(), at(480), at(1030)));
    let routing = StubRoutingProvider::default()
        .with_quote(home(1), quote(5))
        .with_quote(home(2), quote(5));
    let mut req = request("17:00");
    req.direction = Direction::GoHome;
    let outcome = engine(store, Arc::new(routing))
        .find_matches(&req)
        .await
        .expect("match");
    let MatchOutcome::Detour { matches } = outcome else {
        panic!("expected detour outcome");
    };
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].candidate.id, "easy");
    assert_eq!(matches[0].score.time_difference_minutes, 10);
}

#[rstest]
#[tokio::test]
async fn candidates_without_home_are_dropped(located_requester: MemoryScheduleStore) {
    let store = located_requester
        .with_user(driver("placed", Some(home(1))))
        .with_user(driver("unplaced", None))
        .with_entry(entry("placed", 510))
        .with_entry(entry("unplaced", 510));
    let routing = Arc::new(StubRoutingProvider::default().with_quote(home(1), quote(1)));
    let outcome = engine(store, routing.clone())
        .find_matches(&request("08:30"))
        .await
        .expect("match");
    assert_eq!(outcome.candidate_ids(), ["placed"]);
    assert_eq!(routing.calls(), 1);
}

#[rstest]
#[tokio::test]
async fn detour_passes_through_requester_home_to_campus(located_requester: MemoryScheduleStore) {
    let store = located_requester
        .with_user(driver("d1", Some(home(1))))
        .with_entry(entry("d1", 510));
    let routing = Arc::new(StubRoutingProvider::default().with_quote(home(1), quote(1)));
    engine(store, routing.clone())
        .find_matches(&request("08:30"))
        .await
        .expect("match");
    assert_eq!(
        routing.requests(),
        [[
            Location::from(home(1)).to_string(),
            Location::from(REQUESTER_HOME).to_string(),
            Location::from(CAMPUS).to_string(),
        ]]
    );
}

fn failing_store(store: MemoryScheduleStore) -> MemoryScheduleStore {
    store
        .with_user(driver("ok", Some(home(1))))
        .with_user(driver("broken", Some(home(2))))
        .with_entry(entry("ok", 510))
        .with_entry(entry("broken", 512))
}

fn failing_routing() -> StubRoutingProvider {
    StubRoutingProvider::default()
        .with_quote(home(1), quote(1))
        .with_error(
            home(2),
            RoutingError::Status {
                endpoint: "directions",
                status: "OVER_QUERY_LIMIT".into(),
                message: None,
            },
        )
}

#[rstest]
#[tokio::test]
async fn routing_failure_aborts_by_default(located_requester: MemoryScheduleStore) {
    let err = engine(failing_store(located_requester), Arc::new(failing_routing()))
        .find_matches(&request("08:30"))
        .await
        .expect_err("routing failure");
    assert!(matches!(
        err,
        MatchError::Routing { ref candidate_id, .. } if candidate_id == "broken"
    ));
}

#[rstest]
#[tokio::test]
async fn skip_policy_isolates_failed_candidates(located_requester: MemoryScheduleStore) {
    let config =
        MatchEngineConfig::default().with_routing_failure(RoutingFailurePolicy::SkipCandidate);
    let outcome = engine(failing_store(located_requester), Arc::new(failing_routing()))
        .with_config(config)
        .find_matches(&request("08:30"))
        .await
        .expect("match");
    assert_eq!(outcome.candidate_ids(), ["ok"]);
}

#[rstest]
#[case(RoutingFailurePolicy::Abort)]
#[case(RoutingFailurePolicy::SkipCandidate)]
#[tokio::test]
async fn slow_lookups_hit_the_timeout(
    located_requester: MemoryScheduleStore,
    #[case] policy: RoutingFailurePolicy,
) {
    let store = located_requester
        .with_user(driver("slow", Some(home(1))))
        .with_entry(entry("slow", 510));
    let routing = StubRoutingProvider::default()
        .with_quote(home(1), quote(1))
        .with_delay(Duration::from_millis(500));
    let config = MatchEngineConfig::default()
        .with_routing_timeout(Duration::from_millis(10))
        .with_routing_failure(policy);
    let result = engine(store, Arc::new(routing))
        .with_config(config)
        .find_matches(&request("08:30"))
        .await;
    match policy {
        RoutingFailurePolicy::Abort => assert!(matches!(
            result,
            Err(MatchError::RoutingTimeout { ref candidate_id, .. }) if candidate_id == "slow"
        )),
        RoutingFailurePolicy::SkipCandidate => {
            assert!(result.expect("skipped").is_empty());
        }
    }
}

#[rstest]
#[tokio::test]
async fn detour_lookups_respect_concurrency_cap(located_requester: MemoryScheduleStore) {
    let mut store = located_requester;
    let mut routing = StubRoutingProvider::default().with_delay(Duration::from_millis(5));
    for n in 0..12 {
        let id = format!("d{n}");
        store = store
            .with_user(driver(&id, Some(home(n))))
            .with_entry(entry(&id, 510));
        routing = routing.with_quote(home(n), quote(1));
    }
    let routing = Arc::new(routing);
    let outcome = engine(store, routing.clone())
        .with_config(MatchEngineConfig::default().with_detour_concurrency(3))
        .find_matches(&request("08:30"))
        .await
        .expect("match");
    assert_eq!(outcome.len(), 12);
    assert_eq!(routing.calls(), 12);
    assert!(routing.peak_in_flight() <= 3);
}

#[rstest]
#[tokio::test]
async fn rows_outside_the_query_are_ignored() {
    let mut disabled = entry("off", 510);
    disabled.enabled = false;
    let store = MemoryScheduleStore::default()
        .with_user(sample_user("req", "Main Campus", Role::Driver, None))
        .with_user(driver("good", None))
        .with_user(driver("off", None))
        .with_user(sample_user("elsewhere", "North Campus", Role::Driver, None))
        .with_user(sample_user("rider", "Main Campus", Role::Passenger, None))
        .with_user(driver("late", None))
        .with_entry(entry("req", 510))
        .with_entry(entry("good", 510))
        .with_entry(disabled)
        .with_entry(entry("elsewhere", 510))
        .with_entry(entry("rider", 510))
        .with_entry(entry("late", 700))
        .ignoring_filters();
    let outcome = engine(store, Arc::new(StubRoutingProvider::default()))
        .find_matches(&request("08:30"))
        .await
        .expect("match");
    assert_eq!(outcome.candidate_ids(), ["good"]);
}

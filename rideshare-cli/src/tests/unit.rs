//! Focused unit tests covering CLI configuration and command execution.

use super::helpers::{RecordingProviderBuilder, Workspace};
use super::*;
use crate::availability::{AvailabilityConfig, execute_availability};
use crate::import::{ImportArgs, ImportConfig, ImportSummary, execute_import};
use crate::matching::{
    DEFAULT_FLEXIBILITY_MINUTES, FailureMode, MatchConfig, config_from_layers_for_test,
    execute_match,
};
use crate::places::{PlacesConfig, execute_places};
use crate::routing::{RoutingProviderKind, RoutingSelection};
use rideshare_core::{
    AvailabilityError, Direction, MatchError, MatchOutcome, RoleGroup, RoutingFailurePolicy,
};
use rstest::{fixture, rstest};
use std::time::Duration;

fn base_match_args() -> MatchArgs {
    MatchArgs {
        db: Some("rideshare.sqlite".into()),
        user: Some("pat".into()),
        day: Some(1),
        direction: Some("to-campus".into()),
        time: Some("08:00".into()),
        ..MatchArgs::default()
    }
}

#[fixture]
fn match_args() -> MatchArgs {
    base_match_args()
}

fn match_config(workspace: &Workspace, user: &str, time: &str) -> MatchConfig {
    let args = MatchArgs {
        db: Some(workspace.db.clone()),
        user: Some(user.into()),
        time: Some(time.into()),
        ..base_match_args()
    };
    MatchConfig::try_from(args).expect("valid match config")
}

#[rstest]
#[case::db(ARG_DB, ENV_MATCH_DB)]
#[case::user(ARG_USER, ENV_MATCH_USER)]
#[case::day(ARG_DAY, ENV_MATCH_DAY)]
#[case::direction(ARG_DIRECTION, ENV_MATCH_DIRECTION)]
#[case::time(ARG_TIME, ENV_MATCH_TIME)]
fn converting_match_without_required_fields_errors(
    match_args: MatchArgs,
    #[case] field: &'static str,
    #[case] env_var: &'static str,
) {
    let mut args = match_args;
    match field {
        ARG_DB => args.db = None,
        ARG_USER => args.user = None,
        ARG_DAY => args.day = None,
        ARG_DIRECTION => args.direction = None,
        _ => args.time = None,
    }
    let err = MatchConfig::try_from(args).expect_err("missing field should error");
    match err {
        CliError::MissingArgument {
            field: missing,
            env,
        } => {
            assert_eq!(missing, field);
            assert_eq!(env, env_var);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn match_config_applies_defaults(match_args: MatchArgs) {
    let config = MatchConfig::try_from(match_args).expect("config should build");
    assert_eq!(config.request.requester_id, "pat");
    assert_eq!(config.request.day.get(), 1);
    assert_eq!(config.request.direction, Direction::ToCampus);
    assert_eq!(config.request.flexibility_minutes, DEFAULT_FLEXIBILITY_MINUTES);
    assert_eq!(config.request.role_group, RoleGroup::Driver);
    assert_eq!(config.engine, rideshare_core::MatchEngineConfig::default());
    assert_eq!(config.routing, RoutingSelection::Estimator);
}

#[rstest]
fn match_config_honours_overrides(match_args: MatchArgs) {
    let args = MatchArgs {
        direction: Some("GO_HOME".into()),
        role: Some("passenger".into()),
        flexibility: Some(30),
        detour_concurrency: Some(2),
        routing_timeout_ms: Some(1500),
        on_routing_failure: Some(FailureMode::Skip),
        ..match_args
    };
    let config = MatchConfig::try_from(args).expect("config should build");
    assert_eq!(config.request.direction, Direction::GoHome);
    assert_eq!(config.request.role_group, RoleGroup::Passenger);
    assert_eq!(config.request.flexibility_minutes, 30);
    assert_eq!(config.engine.detour_concurrency, 2);
    assert_eq!(
        config.engine.routing_timeout,
        Some(Duration::from_millis(1500))
    );
    assert_eq!(
        config.engine.routing_failure,
        RoutingFailurePolicy::SkipCandidate
    );
}

#[rstest]
fn match_config_rejects_out_of_range_day(match_args: MatchArgs) {
    let args = MatchArgs {
        day: Some(7),
        ..match_args
    };
    let err = MatchConfig::try_from(args).expect_err("day 7 should fail");
    assert!(matches!(err, CliError::InvalidDay(_)), "got {err:?}");
}

#[rstest]
#[case::direction(Some("sideways"), None)]
#[case::role(None, Some("BOTH"))]
fn match_config_rejects_unknown_labels(
    match_args: MatchArgs,
    #[case] direction: Option<&str>,
    #[case] role: Option<&str>,
) {
    let args = MatchArgs {
        direction: direction.map(str::to_owned).or(match_args.direction.clone()),
        role: role.map(str::to_owned),
        ..match_args
    };
    let err = MatchConfig::try_from(args).expect_err("label should be rejected");
    assert!(matches!(err, CliError::InvalidLabel(_)), "got {err:?}");
}

#[rstest]
#[case::missing(None)]
#[case::blank(Some("  "))]
fn google_provider_requires_api_key(match_args: MatchArgs, #[case] key: Option<&str>) {
    let args = MatchArgs {
        routing_provider: Some(RoutingProviderKind::Google),
        google_api_key: key.map(str::to_owned),
        ..match_args
    };
    let err = MatchConfig::try_from(args).expect_err("key should be required");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_GOOGLE_API_KEY);
            assert_eq!(env, ENV_MATCH_GOOGLE_API_KEY);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn google_selection_keeps_key_out_of_debug(match_args: MatchArgs) {
    let args = MatchArgs {
        routing_provider: Some(RoutingProviderKind::Google),
        google_api_key: Some("secret-key".into()),
        ..match_args
    };
    let config = MatchConfig::try_from(args).expect("config should build");
    assert_eq!(
        config.routing,
        RoutingSelection::Google {
            api_key: "secret-key".into()
        }
    );
    let rendered = format!("{config:?}");
    assert!(!rendered.contains("secret-key"), "{rendered}");
}

#[rstest]
fn invalid_config_layer_maps_to_configuration_error() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "day": "monday" }));

    let err = config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "db": "from-file.sqlite",
            "user": "from-file",
            "day": 2,
            "direction": "go-home",
            "time": "17:00",
        }),
        None,
    );
    composer.push_environment(json!({
        "user": "from-env",
        "flexibility": 20,
    }));
    composer.push_cli(json!({
        "time": "16:30",
    }));

    let config =
        config_from_layers_for_test(composer.layers()).expect("merged config should build");
    assert_eq!(config.db, "from-file.sqlite");
    assert_eq!(config.request.requester_id, "from-env");
    assert_eq!(config.request.day.get(), 2);
    assert_eq!(config.request.direction, Direction::GoHome);
    assert_eq!(config.request.target_time, "16:30");
    assert_eq!(config.request.flexibility_minutes, 20);
}

#[rstest]
#[case::dataset(None, Some("rideshare.sqlite".into()), ARG_DATASET, ENV_IMPORT_DATASET)]
#[case::db(Some("dataset.json".into()), None, ARG_DB, ENV_IMPORT_DB)]
fn converting_import_without_required_fields_errors(
    #[case] dataset: Option<camino::Utf8PathBuf>,
    #[case] db: Option<camino::Utf8PathBuf>,
    #[case] field: &'static str,
    #[case] env_var: &'static str,
) {
    let err = ImportConfig::try_from(ImportArgs { dataset, db }).expect_err("should error");
    match err {
        CliError::MissingArgument {
            field: missing,
            env,
        } => {
            assert_eq!(missing, field);
            assert_eq!(env, env_var);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn import_reports_missing_dataset_file() {
    let workspace = Workspace::new();
    let err = execute_import(&ImportConfig {
        dataset: workspace.dataset.clone(),
        db: workspace.db.clone(),
    })
    .expect_err("dataset was never written");
    match err {
        CliError::MissingSourceFile { field, path } => {
            assert_eq!(field, ARG_DATASET);
            assert_eq!(path, workspace.dataset);
        }
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
    assert!(!workspace.db.exists());
}

#[rstest]
fn import_summarises_written_rows() {
    let workspace = Workspace::new();
    workspace.write_dataset();
    let config = ImportConfig {
        dataset: workspace.dataset.clone(),
        db: workspace.db.clone(),
    };
    let summary = execute_import(&config).expect("import should succeed");
    assert_eq!(
        summary,
        ImportSummary {
            db: workspace.db.clone(),
            users: 5,
            schedules: 5,
        }
    );
    assert!(workspace.db.is_file());

    let again = execute_import(&config).expect("re-import should succeed");
    assert_eq!(again, summary);
}

#[rstest]
fn match_keeps_drivers_within_their_detour_budget() {
    let workspace = Workspace::imported();
    let builder = RecordingProviderBuilder::default();
    let outcome = execute_match(&match_config(&workspace, "pat", "08:00"), &builder)
        .expect("match should succeed");
    let MatchOutcome::Detour { matches } = outcome else {
        panic!("expected a detour outcome, got {outcome:?}");
    };
    assert_eq!(matches.len(), 1, "unexpected matches: {matches:?}");
    assert_eq!(matches[0].candidate.id, "dana");
    assert_eq!(builder.selections(), vec![RoutingSelection::Estimator]);
}

#[rstest]
fn match_without_home_ranks_on_time_alone() {
    let workspace = Workspace::imported();
    let builder = RecordingProviderBuilder::default();
    let outcome = execute_match(&match_config(&workspace, "lee", "08:10"), &builder)
        .expect("match should succeed");
    assert!(outcome.degraded_note().is_some());
    assert_eq!(outcome.candidate_ids(), vec!["dana", "rio"]);
}

#[rstest]
fn match_reports_unknown_campus_with_valid_names() {
    let workspace = Workspace::imported();
    let err = execute_match(
        &match_config(&workspace, "sam", "08:00"),
        &RecordingProviderBuilder::default(),
    )
    .expect_err("campus should be unknown");
    let message = err.to_string();
    match err {
        CliError::Match(MatchError::UnknownCampus(campus)) => {
            assert_eq!(campus.name, "Atlantis");
            assert!(campus.known.iter().any(|name| name == "Main Campus"));
        }
        other => panic!("expected UnknownCampus, found {other:?}"),
    }
    assert!(message.contains("Atlantis"), "{message}");
    assert!(message.contains("Main Campus"), "{message}");
}

#[rstest]
fn match_requires_an_existing_database() {
    let workspace = Workspace::new();
    let err = execute_match(
        &match_config(&workspace, "pat", "08:00"),
        &RecordingProviderBuilder::default(),
    )
    .expect_err("database is missing");
    match err {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_DB),
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
    assert!(!workspace.db.exists());
}

#[rstest]
fn availability_returns_driver_entry() {
    let workspace = Workspace::imported();
    let availability = execute_availability(&AvailabilityConfig {
        db: workspace.db.clone(),
        driver: "dana".into(),
        day: 1,
    })
    .expect("dana drives on Monday");
    assert_eq!(availability.driver.id, "dana");
    assert_eq!(availability.entry.to_campus.to_string(), "08:05");
}

#[rstest]
#[case::passenger("pat", 1)]
#[case::unknown_day("dana", 9)]
#[case::free_day("dana", 3)]
fn availability_failures_surface_lookup_errors(#[case] driver: &str, #[case] day: i64) {
    let workspace = Workspace::imported();
    let err = execute_availability(&AvailabilityConfig {
        db: workspace.db.clone(),
        driver: driver.into(),
        day,
    })
    .expect_err("lookup should fail");
    match (day, err) {
        (9, CliError::Availability(AvailabilityError::InvalidDay(_)))
        | (3, CliError::Availability(AvailabilityError::NotAvailableOnDay { .. }))
        | (1, CliError::Availability(AvailabilityError::DriverNotFound { .. })) => {}
        (_, other) => panic!("unexpected error for {driver} on {day}: {other:?}"),
    }
}

#[rstest]
fn places_limits_suggestions() {
    let builder = RecordingProviderBuilder::default();
    let config = PlacesConfig {
        query: "UBC".into(),
        limit: 2,
        routing: RoutingSelection::Estimator,
    };
    let suggestions = execute_places(&config, &builder).expect("places should succeed");
    let ids: Vec<_> = suggestions.iter().map(|s| s.place_id.as_str()).collect();
    assert_eq!(ids, vec!["ubc-campus", "ubc-bookstore"]);
}

#[rstest]
fn write_json_appends_newline() {
    let mut buffer = Vec::new();
    write_json(&mut buffer, &["a", "b"]).expect("write json");
    let text = String::from_utf8(buffer).expect("utf-8 output");
    assert!(text.ends_with("]\n"), "{text:?}");
    let parsed: Vec<String> = serde_json::from_str(&text).expect("valid json");
    assert_eq!(parsed, vec!["a", "b"]);
}

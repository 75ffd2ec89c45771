//! Match command: rank commute partners for a stored user.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use rideshare_core::{
    DayOfWeek, Direction, MatchEngine, MatchEngineConfig, MatchOutcome, MatchRequest,
    RoleGroup, RoutingFailurePolicy,
};
use rideshare_data::SqliteScheduleStore;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::routing::{RoutingProviderBuilder, RoutingProviderKind, RoutingSelection};
use crate::{
    ARG_DAY, ARG_DB, ARG_DETOUR_CONCURRENCY, ARG_DIRECTION, ARG_FLEXIBILITY,
    ARG_GOOGLE_API_KEY, ARG_ON_ROUTING_FAILURE, ARG_ROLE, ARG_ROUTING_PROVIDER,
    ARG_ROUTING_TIMEOUT_MS, ARG_TIME, ARG_USER, CliError, ENV_MATCH_DAY, ENV_MATCH_DB,
    ENV_MATCH_DIRECTION, ENV_MATCH_GOOGLE_API_KEY, ENV_MATCH_TIME, ENV_MATCH_USER, block_on,
    require_existing, write_json,
};

/// Flexibility applied when `--flexibility` is omitted.
pub(crate) const DEFAULT_FLEXIBILITY_MINUTES: u16 = 15;

/// How a failed detour lookup for one candidate affects the search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum FailureMode {
    /// Fail the search.
    #[default]
    Abort,
    /// Drop the candidate and carry on.
    Skip,
}

impl From<FailureMode> for RoutingFailurePolicy {
    fn from(mode: FailureMode) -> Self {
        match mode {
            FailureMode::Abort => Self::Abort,
            FailureMode::Skip => Self::SkipCandidate,
        }
    }
}

/// CLI arguments for the `match` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "match",
    long_about = "Find drivers or passengers whose weekly schedule is close \
                 to the requested departure time, then rank them by the \
                 extra driving a pickup would cost. Users without a home \
                 location are ranked on time alone.",
    about = "Rank commute partners for a user"
)]
#[ortho_config(prefix = "RIDESHARE")]
pub(crate) struct MatchArgs {
    /// Path to the SQLite schedule database.
    #[arg(long = ARG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
    /// Id of the user searching for partners.
    #[arg(long = ARG_USER, value_name = "id")]
    #[serde(default)]
    pub(crate) user: Option<String>,
    /// Weekday, 0 (Sunday) to 6 (Saturday).
    #[arg(long = ARG_DAY, value_name = "0-6")]
    #[serde(default)]
    pub(crate) day: Option<i64>,
    /// Commute leg: `to-campus` or `go-home`.
    #[arg(long = ARG_DIRECTION, value_name = "direction")]
    #[serde(default)]
    pub(crate) direction: Option<String>,
    /// Desired departure as `HH:MM`.
    #[arg(long = ARG_TIME, value_name = "HH:MM")]
    #[serde(default)]
    pub(crate) time: Option<String>,
    /// Accepted minutes either side of `--time` (default 15).
    #[arg(long = ARG_FLEXIBILITY, value_name = "minutes")]
    #[serde(default)]
    pub(crate) flexibility: Option<u16>,
    /// Counterpart role to search for: `driver` (default) or `passenger`.
    #[arg(long = ARG_ROLE, value_name = "role")]
    #[serde(default)]
    pub(crate) role: Option<String>,
    /// Maximum detour lookups in flight at once.
    #[arg(long = ARG_DETOUR_CONCURRENCY, value_name = "count")]
    #[serde(default)]
    pub(crate) detour_concurrency: Option<usize>,
    /// Upper bound on each detour lookup, in milliseconds.
    #[arg(long = ARG_ROUTING_TIMEOUT_MS, value_name = "ms")]
    #[serde(default)]
    pub(crate) routing_timeout_ms: Option<u64>,
    /// Abort the search or skip the candidate when a detour lookup fails.
    #[arg(long = ARG_ON_ROUTING_FAILURE, value_enum, value_name = "mode")]
    #[serde(default)]
    pub(crate) on_routing_failure: Option<FailureMode>,
    /// Routing backend for detour quotes.
    #[arg(long = ARG_ROUTING_PROVIDER, value_enum, value_name = "provider")]
    #[serde(default)]
    pub(crate) routing_provider: Option<RoutingProviderKind>,
    /// Google Maps API key, required by the `google` provider.
    #[arg(long = ARG_GOOGLE_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) google_api_key: Option<String>,
}

impl MatchArgs {
    pub(crate) fn into_config(self) -> Result<MatchConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        MatchConfig::try_from(merged)
    }
}

/// Resolved `match` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MatchConfig {
    pub(crate) db: Utf8PathBuf,
    pub(crate) request: MatchRequest,
    pub(crate) engine: MatchEngineConfig,
    pub(crate) routing: RoutingSelection,
}

impl TryFrom<MatchArgs> for MatchConfig {
    type Error = CliError;

    fn try_from(args: MatchArgs) -> Result<Self, Self::Error> {
        let db = args.db.ok_or(CliError::MissingArgument {
            field: ARG_DB,
            env: ENV_MATCH_DB,
        })?;
        let requester_id = args.user.ok_or(CliError::MissingArgument {
            field: ARG_USER,
            env: ENV_MATCH_USER,
        })?;
        let day = args.day.ok_or(CliError::MissingArgument {
            field: ARG_DAY,
            env: ENV_MATCH_DAY,
        })?;
        let direction = args.direction.ok_or(CliError::MissingArgument {
            field: ARG_DIRECTION,
            env: ENV_MATCH_DIRECTION,
        })?;
        let target_time = args.time.ok_or(CliError::MissingArgument {
            field: ARG_TIME,
            env: ENV_MATCH_TIME,
        })?;
        let role_group = match args.role {
            Some(role) => role.parse::<RoleGroup>()?,
            None => RoleGroup::Driver,
        };

        let mut engine = MatchEngineConfig::default()
            .with_routing_failure(args.on_routing_failure.unwrap_or_default().into());
        if let Some(limit) = args.detour_concurrency {
            engine = engine.with_detour_concurrency(limit);
        }
        if let Some(millis) = args.routing_timeout_ms {
            engine = engine.with_routing_timeout(Duration::from_millis(millis));
        }

        let routing = RoutingSelection::resolve(
            args.routing_provider,
            args.google_api_key,
            ENV_MATCH_GOOGLE_API_KEY,
        )?;

        Ok(Self {
            db,
            request: MatchRequest {
                requester_id,
                day: DayOfWeek::new(day)?,
                direction: direction.parse::<Direction>()?,
                target_time,
                flexibility_minutes: args.flexibility.unwrap_or(DEFAULT_FLEXIBILITY_MINUTES),
                role_group,
            },
            engine,
            routing,
        })
    }
}

pub(crate) fn run_match_with(
    args: MatchArgs,
    builder: &dyn RoutingProviderBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let outcome = execute_match(&config, builder)?;
    write_json(writer, &outcome)
}

pub(crate) fn execute_match(
    config: &MatchConfig,
    builder: &dyn RoutingProviderBuilder,
) -> Result<MatchOutcome, CliError> {
    require_existing(&config.db, ARG_DB)?;
    let store = SqliteScheduleStore::open(&config.db).map_err(|source| CliError::OpenStore {
        path: config.db.clone(),
        source,
    })?;
    let routing = builder.build(&config.routing)?;
    let engine = MatchEngine::new(Arc::new(store), routing).with_config(config.engine.clone());
    let outcome = block_on(engine.find_matches(&config.request))??;
    info!(
        user = %config.request.requester_id,
        matches = outcome.len(),
        degraded = outcome.degraded_note().is_some(),
        "match complete"
    );
    Ok(outcome)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<MatchConfig, CliError> {
    let merged = MatchArgs::merge_from_layers(layers).map_err(CliError::from)?;
    MatchConfig::try_from(merged)
}

//! Command-line interface for the campus rideshare matcher.
#![forbid(unsafe_code)]

use std::future::Future;
use std::io::Write;

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use serde::Serialize;

mod availability;
mod error;
mod import;
mod matching;
mod places;
mod routing;

pub use error::CliError;

use availability::{AvailabilityArgs, run_availability_with};
use import::{ImportArgs, run_import_with};
use matching::{MatchArgs, run_match_with};
use places::{PlacesArgs, run_places_with};
use routing::DefaultRoutingProviderBuilder;

const ARG_DATASET: &str = "dataset";
const ARG_DB: &str = "db";
const ARG_USER: &str = "user";
const ARG_DRIVER: &str = "driver";
const ARG_DAY: &str = "day";
const ARG_DIRECTION: &str = "direction";
const ARG_TIME: &str = "time";
const ARG_FLEXIBILITY: &str = "flexibility";
const ARG_ROLE: &str = "role";
const ARG_DETOUR_CONCURRENCY: &str = "detour-concurrency";
const ARG_ROUTING_TIMEOUT_MS: &str = "routing-timeout-ms";
const ARG_ON_ROUTING_FAILURE: &str = "on-routing-failure";
const ARG_QUERY: &str = "query";
const ARG_LIMIT: &str = "limit";
const ARG_ROUTING_PROVIDER: &str = "routing-provider";
const ARG_GOOGLE_API_KEY: &str = "google-api-key";

const ENV_IMPORT_DATASET: &str = "RIDESHARE_CMDS_IMPORT_DATASET";
const ENV_IMPORT_DB: &str = "RIDESHARE_CMDS_IMPORT_DB";
const ENV_MATCH_DB: &str = "RIDESHARE_CMDS_MATCH_DB";
const ENV_MATCH_USER: &str = "RIDESHARE_CMDS_MATCH_USER";
const ENV_MATCH_DAY: &str = "RIDESHARE_CMDS_MATCH_DAY";
const ENV_MATCH_DIRECTION: &str = "RIDESHARE_CMDS_MATCH_DIRECTION";
const ENV_MATCH_TIME: &str = "RIDESHARE_CMDS_MATCH_TIME";
const ENV_MATCH_GOOGLE_API_KEY: &str = "RIDESHARE_CMDS_MATCH_GOOGLE_API_KEY";
const ENV_AVAILABILITY_DB: &str = "RIDESHARE_CMDS_AVAILABILITY_DB";
const ENV_AVAILABILITY_DRIVER: &str = "RIDESHARE_CMDS_AVAILABILITY_DRIVER";
const ENV_AVAILABILITY_DAY: &str = "RIDESHARE_CMDS_AVAILABILITY_DAY";
const ENV_PLACES_QUERY: &str = "RIDESHARE_CMDS_PLACES_QUERY";
const ENV_PLACES_GOOGLE_API_KEY: &str = "RIDESHARE_CMDS_PLACES_GOOGLE_API_KEY";

/// Run the rideshare CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when argument parsing, configuration merging or the
/// selected command fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    let builder = DefaultRoutingProviderBuilder;
    match cli.command {
        Command::Import(args) => run_import_with(args, &mut stdout),
        Command::Match(args) => run_match_with(args, &builder, &mut stdout),
        Command::Availability(args) => run_availability_with(args, &mut stdout),
        Command::Places(args) => run_places_with(args, &builder, &mut stdout),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "rideshare",
    about = "Match campus commuters with compatible drivers and passengers",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load a JSON dataset of users and weekly schedules into SQLite.
    Import(ImportArgs),
    /// Rank commute partners for a user.
    Match(MatchArgs),
    /// Show a driver's schedule entry for a weekday.
    Availability(AvailabilityArgs),
    /// Suggest places for free-text address entry.
    Places(PlacesArgs),
}

/// Drive `future` to completion on a single-threaded runtime.
fn block_on<F: Future>(future: F) -> Result<F::Output, CliError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    Ok(runtime.block_on(future))
}

fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(CliError::MissingSourceFile {
            field,
            path: path.to_path_buf(),
        })
    }
}

fn write_json<T: Serialize + ?Sized>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerializeOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;

//! Availability command: show a driver's schedule for one weekday.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use rideshare_core::{DriverAvailability, driver_availability};
use rideshare_data::SqliteScheduleStore;
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DAY, ARG_DB, ARG_DRIVER, CliError, ENV_AVAILABILITY_DAY, ENV_AVAILABILITY_DB,
    ENV_AVAILABILITY_DRIVER, block_on, require_existing, write_json,
};

/// CLI arguments for the `availability` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "availability",
    about = "Show a driver's enabled schedule entry for a weekday"
)]
#[ortho_config(prefix = "RIDESHARE")]
pub(crate) struct AvailabilityArgs {
    /// Path to the SQLite schedule database.
    #[arg(long = ARG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
    /// Id of the driver to look up.
    #[arg(long = ARG_DRIVER, value_name = "id")]
    #[serde(default)]
    pub(crate) driver: Option<String>,
    /// Weekday, 0 (Sunday) to 6 (Saturday).
    #[arg(long = ARG_DAY, value_name = "0-6")]
    #[serde(default)]
    pub(crate) day: Option<i64>,
}

impl AvailabilityArgs {
    pub(crate) fn into_config(self) -> Result<AvailabilityConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        AvailabilityConfig::try_from(merged)
    }
}

/// Resolved `availability` command configuration.
///
/// The day stays unchecked here so the lookup reports range errors itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AvailabilityConfig {
    pub(crate) db: Utf8PathBuf,
    pub(crate) driver: String,
    pub(crate) day: i64,
}

impl TryFrom<AvailabilityArgs> for AvailabilityConfig {
    type Error = CliError;

    fn try_from(args: AvailabilityArgs) -> Result<Self, Self::Error> {
        let db = args.db.ok_or(CliError::MissingArgument {
            field: ARG_DB,
            env: ENV_AVAILABILITY_DB,
        })?;
        let driver = args.driver.ok_or(CliError::MissingArgument {
            field: ARG_DRIVER,
            env: ENV_AVAILABILITY_DRIVER,
        })?;
        let day = args.day.ok_or(CliError::MissingArgument {
            field: ARG_DAY,
            env: ENV_AVAILABILITY_DAY,
        })?;
        Ok(Self { db, driver, day })
    }
}

pub(crate) fn run_availability_with(
    args: AvailabilityArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let availability = execute_availability(&config)?;
    write_json(writer, &availability)
}

pub(crate) fn execute_availability(
    config: &AvailabilityConfig,
) -> Result<DriverAvailability, CliError> {
    require_existing(&config.db, ARG_DB)?;
    let store = SqliteScheduleStore::open(&config.db).map_err(|source| CliError::OpenStore {
        path: config.db.clone(),
        source,
    })?;
    let availability = block_on(driver_availability(&store, &config.driver, config.day))??;
    Ok(availability)
}

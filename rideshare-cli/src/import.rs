//! Import command: load a JSON dataset into the schedule database.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use rideshare_data::{load_dataset, persist_dataset};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    ARG_DATASET, ARG_DB, CliError, ENV_IMPORT_DATASET, ENV_IMPORT_DB, require_existing, write_json,
};

/// CLI arguments for the `import` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "import",
    long_about = "Read a JSON document of users and weekly schedules and \
                 upsert it into the SQLite schedule database, creating the \
                 database and its parent directories when needed.",
    about = "Import users and schedules into SQLite"
)]
#[ortho_config(prefix = "RIDESHARE")]
pub(crate) struct ImportArgs {
    /// Path to the JSON dataset.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) dataset: Option<Utf8PathBuf>,
    /// Path to the SQLite schedule database.
    #[arg(long = ARG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
}

impl ImportArgs {
    pub(crate) fn into_config(self) -> Result<ImportConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ImportConfig::try_from(merged)
    }
}

/// Resolved `import` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportConfig {
    pub(crate) dataset: Utf8PathBuf,
    pub(crate) db: Utf8PathBuf,
}

impl TryFrom<ImportArgs> for ImportConfig {
    type Error = CliError;

    fn try_from(args: ImportArgs) -> Result<Self, Self::Error> {
        let dataset = args.dataset.ok_or(CliError::MissingArgument {
            field: ARG_DATASET,
            env: ENV_IMPORT_DATASET,
        })?;
        let db = args.db.ok_or(CliError::MissingArgument {
            field: ARG_DB,
            env: ENV_IMPORT_DB,
        })?;
        Ok(Self { dataset, db })
    }
}

/// Counts written by a successful import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImportSummary {
    pub(crate) db: Utf8PathBuf,
    pub(crate) users: usize,
    pub(crate) schedules: usize,
}

pub(crate) fn run_import_with(args: ImportArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    let summary = execute_import(&config)?;
    write_json(writer, &summary)
}

pub(crate) fn execute_import(config: &ImportConfig) -> Result<ImportSummary, CliError> {
    require_existing(&config.dataset, ARG_DATASET)?;
    let dataset = load_dataset(&config.dataset)?;
    persist_dataset(&config.db, &dataset).map_err(|source| CliError::PersistDataset {
        path: config.db.clone(),
        source,
    })?;
    info!(
        users = dataset.users.len(),
        schedules = dataset.schedules.len(),
        db = %config.db,
        "imported dataset"
    );
    Ok(ImportSummary {
        db: config.db.clone(),
        users: dataset.users.len(),
        schedules: dataset.schedules.len(),
    })
}

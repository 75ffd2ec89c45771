//! Error types emitted by the rideshare CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use rideshare_core::{AvailabilityError, InvalidDayOfWeek, LabelError, MatchError, RoutingError};
use rideshare_data::{LoadDatasetError, PersistDatasetError, ProviderBuildError, SqliteStoreError};
use thiserror::Error;

/// Errors emitted by the rideshare CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name without the leading dashes.
        field: &'static str,
        /// Environment variable that can supply the value.
        env: &'static str,
    },
    /// A referenced input path does not exist on disk or is not a file.
    #[error("{field} path {path:?} does not exist or is not a file")]
    MissingSourceFile {
        /// Flag naming the path.
        field: &'static str,
        /// The path that was checked.
        path: Utf8PathBuf,
    },
    /// The weekday is outside `0..=6`.
    #[error(transparent)]
    InvalidDay(#[from] InvalidDayOfWeek),
    /// A role, role group or direction label was not recognised.
    #[error(transparent)]
    InvalidLabel(#[from] LabelError),
    /// The dataset file could not be read.
    #[error(transparent)]
    LoadDataset(#[from] LoadDatasetError),
    /// Writing the dataset into SQLite failed.
    #[error("failed to import dataset into {path:?}: {source}")]
    PersistDataset {
        /// Database path.
        path: Utf8PathBuf,
        /// Underlying failure.
        #[source]
        source: PersistDatasetError,
    },
    /// Opening the schedule database failed.
    #[error("failed to open schedule database {path:?}: {source}")]
    OpenStore {
        /// Database path.
        path: Utf8PathBuf,
        /// Underlying failure.
        #[source]
        source: SqliteStoreError,
    },
    /// Constructing the mapping-API routing provider failed.
    #[error("failed to build routing provider: {0}")]
    BuildRoutingProvider(#[from] ProviderBuildError),
    /// Building the async runtime failed.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The match search failed.
    #[error("match failed: {0}")]
    Match(#[from] MatchError),
    /// The availability lookup failed.
    #[error("availability lookup failed: {0}")]
    Availability(#[from] AvailabilityError),
    /// Place autocomplete failed.
    #[error("place search failed: {0}")]
    Places(#[from] RoutingError),
    /// Serializing command output failed.
    #[error("failed to serialize output: {0}")]
    SerializeOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}

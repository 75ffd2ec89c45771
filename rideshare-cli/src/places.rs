//! Places command: autocomplete free-text addresses.

use std::io::Write;

use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use rideshare_core::{DEFAULT_AUTOCOMPLETE_LIMIT, PlaceSuggestion};
use serde::{Deserialize, Serialize};

use crate::routing::{RoutingProviderBuilder, RoutingProviderKind, RoutingSelection};
use crate::{
    ARG_GOOGLE_API_KEY, ARG_LIMIT, ARG_QUERY, ARG_ROUTING_PROVIDER, CliError,
    ENV_PLACES_GOOGLE_API_KEY, ENV_PLACES_QUERY, block_on, write_json,
};

/// CLI arguments for the `places` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(name = "places", about = "Suggest places matching a free-text query")]
#[ortho_config(prefix = "RIDESHARE")]
pub(crate) struct PlacesArgs {
    /// Free-text address or place name.
    #[arg(value_name = ARG_QUERY)]
    #[serde(default)]
    pub(crate) query: Option<String>,
    /// Maximum number of suggestions (default 5).
    #[arg(long = ARG_LIMIT, value_name = "count")]
    #[serde(default)]
    pub(crate) limit: Option<usize>,
    /// Routing backend answering the query.
    #[arg(long = ARG_ROUTING_PROVIDER, value_enum, value_name = "provider")]
    #[serde(default)]
    pub(crate) routing_provider: Option<RoutingProviderKind>,
    /// Google Maps API key, required by the `google` provider.
    #[arg(long = ARG_GOOGLE_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) google_api_key: Option<String>,
}

impl PlacesArgs {
    pub(crate) fn into_config(self) -> Result<PlacesConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        PlacesConfig::try_from(merged)
    }
}

/// Resolved `places` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlacesConfig {
    pub(crate) query: String,
    pub(crate) limit: usize,
    pub(crate) routing: RoutingSelection,
}

impl TryFrom<PlacesArgs> for PlacesConfig {
    type Error = CliError;

    fn try_from(args: PlacesArgs) -> Result<Self, Self::Error> {
        let query = args.query.ok_or(CliError::MissingArgument {
            field: ARG_QUERY,
            env: ENV_PLACES_QUERY,
        })?;
        let routing = RoutingSelection::resolve(
            args.routing_provider,
            args.google_api_key,
            ENV_PLACES_GOOGLE_API_KEY,
        )?;
        Ok(Self {
            query,
            limit: args.limit.unwrap_or(DEFAULT_AUTOCOMPLETE_LIMIT),
            routing,
        })
    }
}

pub(crate) fn run_places_with(
    args: PlacesArgs,
    builder: &dyn RoutingProviderBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let suggestions = execute_places(&config, builder)?;
    write_json(writer, &suggestions)
}

pub(crate) fn execute_places(
    config: &PlacesConfig,
    builder: &dyn RoutingProviderBuilder,
) -> Result<Vec<PlaceSuggestion>, CliError> {
    let provider = builder.build(&config.routing)?;
    let suggestions = block_on(provider.autocomplete(&config.query, config.limit))??;
    Ok(suggestions)
}

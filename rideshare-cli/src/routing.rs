//! Routing provider selection shared by the `match` and `places` commands.

use std::sync::Arc;

use clap::ValueEnum;
use rideshare_core::{EstimatorRoutingProvider, RoutingProvider};
use rideshare_data::{MapsApiConfig, MapsRoutingProvider};
use serde::{Deserialize, Serialize};

use crate::{ARG_GOOGLE_API_KEY, CliError};

/// Which routing backend answers duration and place queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum RoutingProviderKind {
    /// Offline haversine estimate with a built-in place catalogue.
    #[default]
    Estimator,
    /// Google Maps web services.
    Google,
}

/// Routing backend resolved from merged configuration.
#[derive(Clone, PartialEq, Eq)]
pub(crate) enum RoutingSelection {
    Estimator,
    Google { api_key: String },
}

impl std::fmt::Debug for RoutingSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Estimator => f.write_str("Estimator"),
            Self::Google { .. } => f
                .debug_struct("Google")
                .field("api_key", &"<redacted>")
                .finish(),
        }
    }
}

impl RoutingSelection {
    /// Combine the provider flag with the API key, which `google` requires.
    pub(crate) fn resolve(
        kind: Option<RoutingProviderKind>,
        api_key: Option<String>,
        api_key_env: &'static str,
    ) -> Result<Self, CliError> {
        match kind.unwrap_or_default() {
            RoutingProviderKind::Estimator => Ok(Self::Estimator),
            RoutingProviderKind::Google => {
                let api_key = api_key
                    .filter(|key| !key.trim().is_empty())
                    .ok_or(CliError::MissingArgument {
                        field: ARG_GOOGLE_API_KEY,
                        env: api_key_env,
                    })?;
                Ok(Self::Google { api_key })
            }
        }
    }
}

/// Builds the routing provider for the current invocation.
pub(crate) trait RoutingProviderBuilder {
    fn build(&self, selection: &RoutingSelection) -> Result<Arc<dyn RoutingProvider>, CliError>;
}

pub(crate) struct DefaultRoutingProviderBuilder;

impl RoutingProviderBuilder for DefaultRoutingProviderBuilder {
    fn build(&self, selection: &RoutingSelection) -> Result<Arc<dyn RoutingProvider>, CliError> {
        match selection {
            RoutingSelection::Estimator => Ok(Arc::new(EstimatorRoutingProvider::new())),
            RoutingSelection::Google { api_key } => {
                let provider = MapsRoutingProvider::from_config(MapsApiConfig::new(api_key))?;
                Ok(Arc::new(provider))
            }
        }
    }
}

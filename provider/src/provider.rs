//! Speechmatics provider
//!
//! Implements the host lifecycle: metadata, provider schema, configure (with
//! a credential probe against the Speechmatics API) and the lists of resource
//! and data source constructors.

use std::fmt;
use std::sync::Arc;

use speechmatics_plugin_api::{
    Attribute, AttributePath, ConfigureRequest, ConfigureResponse, DataSourceFactory, Diagnostic,
    Diagnostics, PluginError, Provider, ProviderData, ProviderMetadata, ResourceFactory, Schema,
    async_trait, downcast_provider_data,
};
use tracing::{debug, error, info};

use crate::config::{ATTR_API_KEY, ATTR_ENDPOINT, ProviderModel};
use crate::plugin::global_registry;
use crate::speechmatics::{SpeechmaticsClient, SpeechmaticsError};

/// Type name prefix for every resource and data source.
pub const PROVIDER_TYPE_NAME: &str = "speechmatics";

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

pub struct SpeechmaticsProvider {
    version: String,
    env_lookup: EnvLookup,
}

impl fmt::Debug for SpeechmaticsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechmaticsProvider")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl SpeechmaticsProvider {
    /// `version` is "dev" for local builds, "test" under acceptance tests and
    /// the release version otherwise.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            env_lookup: Arc::new(|name| std::env::var(name).ok()),
        }
    }

    /// Replace the process environment as the source of fallback values.
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env_lookup = Arc::new(lookup);
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Take the client out of data published by configure.
///
/// `None` is not an error: the host may configure types before the provider
/// has published anything. Data of any other type is.
pub(crate) fn client_from_provider_data(
    provider_data: Option<ProviderData>,
) -> (Option<Arc<SpeechmaticsClient>>, Diagnostics) {
    let mut diags = Diagnostics::new();
    let Some(data) = provider_data else {
        return (None, diags);
    };
    match downcast_provider_data::<SpeechmaticsClient>(&data) {
        Some(client) => (Some(client), diags),
        None => {
            diags.add_error(
                "Unexpected provider data type",
                "Expected a Speechmatics client. Please report this issue to the provider developers.",
            );
            (None, diags)
        }
    }
}

/// The configured client, or an "Unconfigured provider" diagnostic.
pub(crate) fn require_client(
    client: &Option<Arc<SpeechmaticsClient>>,
) -> Result<&SpeechmaticsClient, Diagnostics> {
    client
        .as_deref()
        .ok_or_else(|| Diagnostic::from(PluginError::NotConfigured).into())
}

/// Credential-probe failures keep their cause in the detail text.
fn validation_detail(err: &SpeechmaticsError) -> String {
    match err {
        SpeechmaticsError::Transport(_) => format!(
            "Could not reach the Speechmatics API: {err}. Check the endpoint and network access."
        ),
        SpeechmaticsError::Unauthorized { .. } => {
            format!("The API key was rejected: {err}. Check api_key or SPEECHMATICS_API_TOKEN.")
        }
        _ => format!("The credential check did not return 200 OK: {err}"),
    }
}

#[async_trait]
impl Provider for SpeechmaticsProvider {
    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            type_name: PROVIDER_TYPE_NAME.to_string(),
            version: self.version.clone(),
        }
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_description("Manage Speechmatics batch transcription jobs.")
            .with_attribute(
                ATTR_ENDPOINT,
                Attribute::optional_string().with_description("Speechmatics endpoint to use"),
            )
            .with_attribute(
                ATTR_API_KEY,
                Attribute::required_string()
                    .sensitive()
                    .with_description("API key to authenticate with Speechmatics"),
            )
    }

    async fn configure(&self, request: ConfigureRequest) -> ConfigureResponse {
        let mut response = ConfigureResponse::default();

        let model = match ProviderModel::from_config(&request.config) {
            Ok(model) => model,
            Err(diags) => {
                response.diagnostics.append(diags);
                return response;
            }
        };
        debug!(?model, "Read provider configuration");

        let resolved = match model.resolve_with(|name| (self.env_lookup)(name)) {
            Ok(resolved) => resolved,
            Err(diags) => {
                response.diagnostics.append(diags);
                return response;
            }
        };

        let client = match SpeechmaticsClient::new(resolved) {
            Ok(client) => client,
            Err(e) => {
                error!(error = %e, "Invalid Speechmatics endpoint");
                response.diagnostics.add_attribute_error(
                    AttributePath::root(ATTR_ENDPOINT),
                    "Invalid Speechmatics endpoint",
                    e.to_string(),
                );
                return response;
            }
        };

        if let Err(e) = client.validate_credentials().await {
            error!(
                endpoint = %client.base_url(),
                status = ?e.status(),
                error = %e,
                "Speechmatics credential validation failed"
            );
            response.diagnostics.add_error(
                "Unable to validate Speechmatics credentials",
                validation_detail(&e),
            );
            return response;
        }

        info!(endpoint = %client.base_url(), "Speechmatics provider configured");
        let data: ProviderData = Arc::new(client);
        response.resource_data = Some(Arc::clone(&data));
        response.data_source_data = Some(data);
        response
    }

    fn resources(&self) -> Vec<ResourceFactory> {
        global_registry().resource_factories()
    }

    fn data_sources(&self) -> Vec<DataSourceFactory> {
        global_registry().data_source_factories()
    }
}

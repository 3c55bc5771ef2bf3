//! Provider configuration
//!
//! Resolves the provider block into an endpoint / API key pair. Explicit
//! attributes take precedence over environment variables:
//!
//! | Attribute  | Environment variable     |
//! |------------|--------------------------|
//! | `endpoint` | `SPEECHMATICS_URL`       |
//! | `api_key`  | `SPEECHMATICS_API_TOKEN` |
//!
//! A field set in neither place stays empty. `api_key` is required by the
//! provider schema, so a missing key is rejected before configure runs.
//!
//! # Example
//! ```rust,no_run
//! use speechmatics_plugin_api::ObjectValue;
//! use speechmatics_provider::config::ProviderModel;
//!
//! let block = ObjectValue::new().with("api_key", "my-key");
//! let model = ProviderModel::from_config(&block).expect("valid block");
//! let resolved = model.resolve().expect("resolved");
//! println!("Using endpoint {}", resolved.endpoint());
//! ```

use std::fmt;

use speechmatics_plugin_api::{AttributePath, Diagnostics, ObjectValue, StringValue};
use zeroize::{Zeroize, ZeroizeOnDrop};

mod yaml;

pub use yaml::{ConfigError, load_provider_block, parse_provider_block};

/// Environment variable holding the fallback endpoint.
pub const ENV_ENDPOINT: &str = "SPEECHMATICS_URL";

/// Environment variable holding the fallback API key.
pub const ENV_API_KEY: &str = "SPEECHMATICS_API_TOKEN";

pub const ATTR_ENDPOINT: &str = "endpoint";
pub const ATTR_API_KEY: &str = "api_key";

/// Typed view of the provider block.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProviderModel {
    pub endpoint: StringValue,
    pub api_key: StringValue,
}

impl fmt::Debug for ProviderModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = match self.api_key {
            StringValue::Known(_) => "<redacted>",
            StringValue::Unknown => "<unknown>",
            StringValue::Null => "<null>",
        };
        f.debug_struct("ProviderModel")
            .field("endpoint", &self.endpoint)
            .field("api_key", &api_key)
            .finish()
    }
}

impl Drop for ProviderModel {
    fn drop(&mut self) {
        if let StringValue::Known(ref mut key) = self.api_key {
            key.zeroize();
        }
    }
}

fn read_string(config: &ObjectValue, name: &str, diags: &mut Diagnostics) -> StringValue {
    config.get_string(name).unwrap_or_else(|| {
        diags.add_attribute_error(
            AttributePath::root(name),
            "Value Conversion Error",
            format!(
                "Expected a string for \"{name}\", got {}.",
                config.get(name).type_name()
            ),
        );
        StringValue::Null
    })
}

impl ProviderModel {
    /// Read the typed model out of a raw provider block.
    pub fn from_config(config: &ObjectValue) -> Result<Self, Diagnostics> {
        let mut diags = Diagnostics::new();
        let endpoint = read_string(config, ATTR_ENDPOINT, &mut diags);
        let api_key = read_string(config, ATTR_API_KEY, &mut diags);

        if diags.has_error() {
            return Err(diags);
        }
        Ok(Self { endpoint, api_key })
    }

    /// Resolve against the process environment.
    pub fn resolve(&self) -> Result<ResolvedConfig, Diagnostics> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve using `lookup` in place of the process environment.
    pub fn resolve_with<F>(&self, lookup: F) -> Result<ResolvedConfig, Diagnostics>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut diags = Diagnostics::new();

        if self.api_key.is_unknown() {
            diags.add_attribute_error(
                AttributePath::root(ATTR_API_KEY),
                "Speechmatics API key not provided",
                "Speechmatics requires an API key to authenticate",
            );
        }

        let mut endpoint = lookup(ENV_ENDPOINT).unwrap_or_default();
        let mut api_key = lookup(ENV_API_KEY).unwrap_or_default();

        if !self.endpoint.is_null() {
            endpoint = self.endpoint.value_string().to_string();
        }

        if !self.api_key.is_null() {
            api_key.zeroize();
            api_key = self.api_key.value_string().to_string();
        }

        if diags.has_error() {
            api_key.zeroize();
            return Err(diags);
        }

        Ok(ResolvedConfig { endpoint, api_key })
    }
}

/// Endpoint and API key after precedence has been applied.
///
/// The API key is cleared from memory on drop and never printed by `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ResolvedConfig {
    endpoint: String,
    api_key: String,
}

impl ResolvedConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

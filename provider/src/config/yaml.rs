use std::path::Path;

use speechmatics_plugin_api::ObjectValue;
use thiserror::Error;

/// Errors raised while loading a provider block from disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Provider block cannot be represented as attributes: {0}")]
    Conversion(#[from] serde_json::Error),

    #[error("Provider block must be a mapping")]
    NotAMapping,
}

/// Parse a provider block from YAML text.
///
/// Either of these shapes is accepted:
///
/// ```yaml
/// endpoint: "https://asr.api.speechmatics.com"
/// api_key: "your-api-key"
/// ```
///
/// ```yaml
/// provider:
///   speechmatics:
///     endpoint: "https://asr.api.speechmatics.com"
///     api_key: "your-api-key"
/// ```
///
/// Attributes left out are null, so environment variables fill them in.
pub fn parse_provider_block(content: &str) -> Result<ObjectValue, ConfigError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;

    let block = match yaml
        .get("provider")
        .and_then(|provider| provider.get("speechmatics"))
    {
        Some(nested) => nested.clone(),
        None => yaml,
    };

    match serde_json::to_value(block)? {
        serde_json::Value::Object(map) => Ok(ObjectValue::from_json_map(map)),
        // an empty document means "everything from the environment"
        serde_json::Value::Null => Ok(ObjectValue::new()),
        _ => Err(ConfigError::NotAMapping),
    }
}

/// Load a provider block from a YAML file.
pub fn load_provider_block(path: &Path) -> Result<ObjectValue, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_provider_block(&content)
}

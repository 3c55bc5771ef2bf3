//! Errors raised by the lifecycle contract itself.

use thiserror::Error;

use crate::diagnostics::Diagnostic;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Provider is not configured")]
    NotConfigured,

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Unknown data source type: {0}")]
    UnknownDataSourceType(String),

    #[error("Duplicate type name: {0}")]
    DuplicateTypeName(String),

    #[error("Attributes require replacement: {}", .0.join(", "))]
    RequiresReplace(Vec<String>),
}

impl PluginError {
    fn summary(&self) -> &'static str {
        match self {
            PluginError::NotConfigured => "Unconfigured provider",
            PluginError::UnknownResourceType(_) => "Unknown resource type",
            PluginError::UnknownDataSourceType(_) => "Unknown data source type",
            PluginError::DuplicateTypeName(_) => "Duplicate type name",
            PluginError::RequiresReplace(_) => "Resource requires replacement",
        }
    }
}

impl From<PluginError> for Diagnostic {
    fn from(err: PluginError) -> Self {
        Diagnostic::error(err.summary(), err.to_string())
    }
}

use reqwest::StatusCode;
use speechmatics_plugin_api::Diagnostic;
use thiserror::Error;

use crate::utils::UrlValidationError;

// =============================================================================
// Error Types
// =============================================================================

/// Errors returned by [`SpeechmaticsClient`](super::SpeechmaticsClient).
#[derive(Debug, Error)]
pub enum SpeechmaticsError {
    /// Endpoint failed validation; no request was sent
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(#[from] UrlValidationError),

    /// Request could not be built or sent, or the response body could not be read
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Credentials rejected (401 / 403)
    #[error("Authentication failed ({status}): {message}")]
    Unauthorized { status: StatusCode, message: String },

    /// Job does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Service rejected the request with an error body
    #[error("Speechmatics API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    /// A status the calling operation does not accept
    #[error("Unexpected status: {0}")]
    UnexpectedStatus(StatusCode),

    /// Response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result type for Speechmatics client operations.
pub type SpeechmaticsResult<T> = Result<T, SpeechmaticsError>;

impl SpeechmaticsError {
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// HTTP status behind the error, when there was a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::UnexpectedStatus(status) => Some(*status),
            Self::NotFound(_) => Some(StatusCode::NOT_FOUND),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// Convert to an error diagnostic with the given summary.
    pub fn to_diagnostic(&self, summary: &str) -> Diagnostic {
        Diagnostic::error(summary, self.to_string())
    }
}

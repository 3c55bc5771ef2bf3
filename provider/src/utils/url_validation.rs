//! Endpoint URL validation
//!
//! The Speechmatics endpoint comes from user configuration or the
//! environment. Before any request is sent it must:
//! - Be non-empty and parseable
//! - Use `http` or `https`
//! - Have a host
//! - Carry no query string or fragment
//!
//! Plain HTTP is accepted (self-hosted and test deployments use it) but logged
//! when the host is not a loopback address, since the API key travels in the
//! `Authorization` header.

use thiserror::Error;
use tracing::warn;
use url::Url;

/// Errors that can occur during endpoint validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlValidationError {
    #[error("Endpoint is empty; set the provider `endpoint` attribute or SPEECHMATICS_URL")]
    Empty,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(#[from] url::ParseError),

    #[error("URL scheme must be http or https, got: {0}")]
    UnsupportedScheme(String),

    #[error("URL must have a host")]
    MissingHost,

    #[error("Endpoint must not contain a query string or fragment")]
    QueryOrFragment,
}

fn is_loopback_host(parsed: &Url) -> bool {
    match parsed.host() {
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        Some(url::Host::Domain(d)) => d == "localhost",
        None => false,
    }
}

/// Validates a Speechmatics endpoint and returns the parsed URL.
///
/// # Example
/// ```rust,ignore
/// use speechmatics_provider::utils::validate_endpoint;
///
/// assert!(validate_endpoint("https://asr.api.speechmatics.com").is_ok());
/// assert!(validate_endpoint("ftp://asr.api.speechmatics.com").is_err());
/// assert!(validate_endpoint("").is_err());
/// ```
pub fn validate_endpoint(endpoint: &str) -> Result<Url, UrlValidationError> {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        return Err(UrlValidationError::Empty);
    }

    let parsed = Url::parse(trimmed)?;

    let scheme = parsed.scheme();
    if scheme != "https" && scheme != "http" {
        return Err(UrlValidationError::UnsupportedScheme(scheme.to_string()));
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(UrlValidationError::QueryOrFragment);
    }

    if scheme == "http" && !is_loopback_host(&parsed) {
        warn!(
            host = parsed.host_str().unwrap_or_default(),
            "Speechmatics endpoint uses plain HTTP; the API key is sent unencrypted"
        );
    }

    Ok(parsed)
}

/// Join an API path onto the endpoint.
///
/// Any path prefix on the endpoint is kept and empty segments are skipped,
/// so `https://host/proxy/` + `v2/jobs` is `https://host/proxy/v2/jobs`.
/// A query or fragment on the endpoint is dropped.
pub fn api_url(endpoint: &Url, path: &str) -> Result<Url, UrlValidationError> {
    let mut url = endpoint.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|()| UrlValidationError::MissingHost)?
        .pop_if_empty()
        .extend(path.split('/').filter(|segment| !segment.is_empty()));
    Ok(url)
}

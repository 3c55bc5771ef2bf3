//! Speechmatics batch API client.
//!
//! Thin REST wrapper over `/v2/jobs`. Every request carries the API key as a
//! Bearer token. Error bodies (`{"code", "error", "detail"}`) are folded into
//! [`SpeechmaticsError`] so callers can turn them into diagnostics.

use std::time::Duration;

use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use super::error::{SpeechmaticsError, SpeechmaticsResult};
use super::messages::{
    CreateJobResponse, ErrorResponse, JobConfig, JobDetails, JobDetailsResponse, ListJobsQuery,
    ListJobsResponse,
};
use crate::config::ResolvedConfig;
use crate::utils::{api_url, validate_endpoint};

// =============================================================================
// Constants
// =============================================================================

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default connect timeout in seconds.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 15;

/// User-Agent header value for API requests.
const USER_AGENT: &str = concat!("terraform-provider-speechmatics/", env!("CARGO_PKG_VERSION"));

/// Collection path, relative to the endpoint.
const JOBS_PATH: &str = "v2/jobs";

/// Transcript output format requested from the API.
const TRANSCRIPT_FORMAT: &str = "txt";

// =============================================================================
// Client
// =============================================================================

/// Authenticated client for one Speechmatics endpoint.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct SpeechmaticsClient {
    http_client: Client,
    base_url: Url,
    config: ResolvedConfig,
}

impl std::fmt::Debug for SpeechmaticsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechmaticsClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl SpeechmaticsClient {
    /// Build a client for the resolved endpoint and key.
    ///
    /// Fails without touching the network when the endpoint is empty or not
    /// an `http(s)` URL.
    pub fn new(config: ResolvedConfig) -> SpeechmaticsResult<Self> {
        let base_url = validate_endpoint(config.endpoint())?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            config,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn jobs_url(&self) -> SpeechmaticsResult<Url> {
        Ok(api_url(&self.base_url, JOBS_PATH)?)
    }

    /// `{endpoint}/v2/jobs/{id}[/{suffix}]`, with `id` percent-encoded as a
    /// single path segment.
    fn job_url(&self, job_id: &str, suffix: Option<&str>) -> SpeechmaticsResult<Url> {
        let mut url = self.jobs_url()?;
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(job_id);
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }
        Ok(url)
    }

    /// Attach credentials, send, and read the whole body.
    async fn execute(&self, request: RequestBuilder) -> SpeechmaticsResult<(StatusCode, String)> {
        let response = request.bearer_auth(self.config.api_key()).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "Speechmatics response");
        Ok((status, body))
    }

    /// Probe the credentials with `GET {endpoint}/v2/jobs`.
    ///
    /// Only `200 OK` is accepted; every other status is an error, including
    /// other 2xx codes.
    pub async fn validate_credentials(&self) -> SpeechmaticsResult<()> {
        let url = self.jobs_url()?;
        debug!(url = %url, "Validating Speechmatics credentials");

        let (status, body) = self.execute(self.http_client.get(url)).await?;
        if status == StatusCode::OK {
            info!("Speechmatics credentials accepted");
            return Ok(());
        }

        warn!(status = status.as_u16(), "Speechmatics credential check failed");
        if status.is_client_error() || status.is_server_error() {
            Err(error_for_status(status, &body, "jobs"))
        } else {
            Err(SpeechmaticsError::UnexpectedStatus(status))
        }
    }

    /// Submit a job and return its id.
    pub async fn create_job(&self, config: &JobConfig) -> SpeechmaticsResult<String> {
        let url = self.jobs_url()?;
        let form = Form::new().text("config", serde_json::to_string(config)?);

        let (status, body) = self
            .execute(self.http_client.post(url).multipart(form))
            .await?;
        if !status.is_success() {
            return Err(error_for_status(status, &body, "jobs"));
        }

        let created: CreateJobResponse = serde_json::from_str(&body)?;
        info!(job_id = %created.id, "Created Speechmatics job");
        Ok(created.id)
    }

    pub async fn get_job(&self, job_id: &str) -> SpeechmaticsResult<JobDetails> {
        let url = self.job_url(job_id, None)?;
        let (status, body) = self.execute(self.http_client.get(url)).await?;
        let response: JobDetailsResponse = decode_success(status, &body, job_id)?;
        Ok(response.job)
    }

    pub async fn list_jobs(&self, query: &ListJobsQuery) -> SpeechmaticsResult<Vec<JobDetails>> {
        let url = self.jobs_url()?;
        let (status, body) = self
            .execute(self.http_client.get(url).query(query))
            .await?;
        let response: ListJobsResponse = decode_success(status, &body, "jobs")?;
        debug!(count = response.jobs.len(), "Listed Speechmatics jobs");
        Ok(response.jobs)
    }

    /// Delete a job. `force` also deletes a job that is still running.
    pub async fn delete_job(&self, job_id: &str, force: bool) -> SpeechmaticsResult<()> {
        let url = self.job_url(job_id, None)?;
        let mut request = self.http_client.delete(url);
        if force {
            request = request.query(&[("force", "true")]);
        }

        let (status, body) = self.execute(request).await?;
        if !status.is_success() {
            return Err(error_for_status(status, &body, job_id));
        }
        info!(job_id, force, "Deleted Speechmatics job");
        Ok(())
    }

    /// Fetch the plain-text transcript of a finished job.
    pub async fn get_transcript(&self, job_id: &str) -> SpeechmaticsResult<String> {
        let url = self.job_url(job_id, Some("transcript"))?;
        let (status, body) = self
            .execute(
                self.http_client
                    .get(url)
                    .query(&[("format", TRANSCRIPT_FORMAT)]),
            )
            .await?;
        if !status.is_success() {
            return Err(error_for_status(status, &body, job_id));
        }
        Ok(body)
    }
}

fn decode_success<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
    subject: &str,
) -> SpeechmaticsResult<T> {
    if !status.is_success() {
        return Err(error_for_status(status, body, subject));
    }
    Ok(serde_json::from_str(body)?)
}

/// Classify a failed response by status, using the error body when it parses.
fn error_for_status(status: StatusCode, body: &str, subject: &str) -> SpeechmaticsError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.message())
        .unwrap_or_else(|_| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("no response body")
                    .to_string()
            } else {
                trimmed.to_string()
            }
        });

    match status.as_u16() {
        401 | 403 => SpeechmaticsError::Unauthorized { status, message },
        404 => SpeechmaticsError::NotFound(format!("{subject}: {message}")),
        400..=599 => SpeechmaticsError::Api { status, message },
        _ => SpeechmaticsError::UnexpectedStatus(status),
    }
}

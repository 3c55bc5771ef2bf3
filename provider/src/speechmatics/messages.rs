//! Request and response types for the Speechmatics batch API (v2).
//!
//! Only the fields the provider reads or writes are modelled; unknown
//! fields in responses are ignored.

use serde::{Deserialize, Serialize};

// =============================================================================
// Job Configuration
// =============================================================================

/// Job type. The provider only submits transcription jobs, but listings also
/// return alignment jobs created elsewhere on the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    #[default]
    Transcription,
    Alignment,
}

impl JobType {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transcription => "transcription",
            Self::Alignment => "alignment",
        }
    }
}

/// Remote media the service downloads itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchData {
    pub url: String,
}

/// Accuracy / cost trade-off of the transcription model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingPoint {
    Standard,
    Enhanced,
}

impl OperatingPoint {
    pub const VALUES: &'static [&'static str] = &["standard", "enhanced"];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Enhanced => "enhanced",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "standard" => Some(Self::Standard),
            "enhanced" => Some(Self::Enhanced),
            _ => None,
        }
    }
}

/// Speaker separation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Diarization {
    None,
    Speaker,
    Channel,
}

impl Diarization {
    pub const VALUES: &'static [&'static str] = &["none", "speaker", "channel"];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Speaker => "speaker",
            Self::Channel => "channel",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "speaker" => Some(Self::Speaker),
            "channel" => Some(Self::Channel),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// ISO language code, e.g. `en`.
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_point: Option<OperatingPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diarization: Option<Diarization>,
}

/// The `config` part of a job submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(rename = "type", default)]
    pub job_type: JobType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_data: Option<FetchData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription_config: Option<TranscriptionConfig>,
}

impl JobConfig {
    /// Transcription of media fetched from `url`.
    pub fn fetch_transcription(url: impl Into<String>, transcription: TranscriptionConfig) -> Self {
        Self {
            job_type: JobType::Transcription,
            fetch_data: Some(FetchData { url: url.into() }),
            transcription_config: Some(transcription),
        }
    }
}

// =============================================================================
// Job Details
// =============================================================================

/// Job status as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Done,
    Rejected,
    Deleted,
    Expired,
    /// Any status this provider does not know about yet.
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Done => "done",
            Self::Rejected => "rejected",
            Self::Deleted => "deleted",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobError {
    #[serde(default)]
    pub timestamp: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDetails {
    pub id: String,
    pub created_at: String,
    #[serde(default)]
    pub data_name: String,
    /// Media duration in seconds; absent until the media has been processed.
    #[serde(default)]
    pub duration: Option<f64>,
    pub status: JobStatus,
    #[serde(default)]
    pub config: Option<JobConfig>,
    #[serde(default)]
    pub errors: Vec<JobError>,
}

impl JobDetails {
    /// Duration rounded to whole seconds.
    pub fn duration_seconds(&self) -> Option<i64> {
        self.duration.map(|d| d.round() as i64)
    }

    pub fn job_type(&self) -> Option<JobType> {
        self.config.as_ref().map(|c| c.job_type)
    }

    pub fn language(&self) -> Option<&str> {
        self.config
            .as_ref()
            .and_then(|c| c.transcription_config.as_ref())
            .map(|t| t.language.as_str())
    }
}

// =============================================================================
// Envelopes
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateJobResponse {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobDetailsResponse {
    pub job: JobDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListJobsResponse {
    #[serde(default)]
    pub jobs: Vec<JobDetails>,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ErrorResponse {
    pub fn message(&self) -> String {
        match self.detail {
            Some(ref detail) if !detail.is_empty() => format!("{}: {}", self.error, detail),
            _ => self.error.clone(),
        }
    }
}

/// Filters for `GET /v2/jobs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListJobsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_deleted: Option<bool>,
}

//! Speechmatics batch transcription API.
//!
//! The provider talks to the v2 jobs API over HTTPS:
//!
//! | Operation              | Request                                  |
//! |------------------------|------------------------------------------|
//! | Credential probe       | `GET {endpoint}/v2/jobs`                 |
//! | Submit job             | `POST {endpoint}/v2/jobs` (multipart)    |
//! | Job details            | `GET {endpoint}/v2/jobs/{id}`            |
//! | List jobs              | `GET {endpoint}/v2/jobs?limit=..`        |
//! | Delete job             | `DELETE {endpoint}/v2/jobs/{id}`         |
//! | Transcript             | `GET {endpoint}/v2/jobs/{id}/transcript` |
//!
//! All requests send `Authorization: Bearer {api_key}`.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use speechmatics_provider::config::ResolvedConfig;
//! use speechmatics_provider::speechmatics::SpeechmaticsClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ResolvedConfig::new(
//!         "https://asr.api.speechmatics.com",
//!         std::env::var("SPEECHMATICS_API_TOKEN")?,
//!     );
//!     let client = SpeechmaticsClient::new(config)?;
//!     client.validate_credentials().await?;
//!     Ok(())
//! }
//! ```
//!
//! # References
//!
//! - [Speechmatics Batch API Reference](https://docs.speechmatics.com/api-ref/batch)

mod client;
mod error;
pub mod messages;


pub use client::SpeechmaticsClient;
pub use error::{SpeechmaticsError, SpeechmaticsResult};
pub use messages::{
    Diarization, JobConfig, JobDetails, JobStatus, JobType, ListJobsQuery, OperatingPoint,
    TranscriptionConfig,
};

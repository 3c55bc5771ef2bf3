//! `speechmatics_transcription` resource
//!
//! One batch transcription job. The job is submitted with a fetch URL so the
//! service downloads the media itself. Every input except `force_delete`
//! forces replacement; the computed attributes track the job as it runs.

use std::sync::Arc;

use speechmatics_plugin_api::{
    Attribute, AttributePath, AttributeType, Diagnostic, Diagnostics, ObjectValue, ProviderData,
    Resource, Schema, Value, async_trait,
};
use tracing::{debug, info, warn};

use crate::provider::{client_from_provider_data, require_client};
use crate::speechmatics::{
    Diarization, JobConfig, JobDetails, JobStatus, OperatingPoint, SpeechmaticsClient,
    TranscriptionConfig,
};

pub const ATTR_ID: &str = "id";
pub const ATTR_AUDIO_URL: &str = "audio_url";
pub const ATTR_LANGUAGE: &str = "language";
pub const ATTR_OPERATING_POINT: &str = "operating_point";
pub const ATTR_DIARIZATION: &str = "diarization";
pub const ATTR_FORCE_DELETE: &str = "force_delete";
pub const ATTR_STATUS: &str = "status";
pub const ATTR_CREATED_AT: &str = "created_at";
pub const ATTR_DATA_NAME: &str = "data_name";
pub const ATTR_DURATION: &str = "duration";
pub const ATTR_TRANSCRIPT: &str = "transcript";

#[derive(Default)]
pub struct TranscriptionResource {
    client: Option<Arc<SpeechmaticsClient>>,
}

/// Inputs read from a plan.
#[derive(Debug)]
struct TranscriptionPlan {
    audio_url: String,
    language: String,
    operating_point: Option<OperatingPoint>,
    diarization: Option<Diarization>,
}

fn required_string(plan: &ObjectValue, name: &str, diags: &mut Diagnostics) -> String {
    match plan.get(name).as_str() {
        Some(s) if !s.trim().is_empty() => s.to_string(),
        _ => {
            diags.add_attribute_error(
                AttributePath::root(name),
                "Invalid attribute value",
                format!("\"{name}\" must be a non-empty string."),
            );
            String::new()
        }
    }
}

fn optional_enum<T>(
    plan: &ObjectValue,
    name: &str,
    allowed: &[&str],
    parse: fn(&str) -> Option<T>,
    diags: &mut Diagnostics,
) -> Option<T> {
    let raw = plan.get(name).as_str()?;
    let parsed = parse(raw);
    if parsed.is_none() {
        diags.add_attribute_error(
            AttributePath::root(name),
            "Invalid attribute value",
            format!(
                "\"{name}\" must be one of {}, got \"{raw}\".",
                allowed.join(", ")
            ),
        );
    }
    parsed
}

impl TranscriptionPlan {
    fn from_plan(plan: &ObjectValue) -> Result<Self, Diagnostics> {
        let mut diags = Diagnostics::new();
        let audio_url = required_string(plan, ATTR_AUDIO_URL, &mut diags);
        let language = required_string(plan, ATTR_LANGUAGE, &mut diags);
        let operating_point = optional_enum(
            plan,
            ATTR_OPERATING_POINT,
            OperatingPoint::VALUES,
            OperatingPoint::parse,
            &mut diags,
        );
        let diarization = optional_enum(
            plan,
            ATTR_DIARIZATION,
            Diarization::VALUES,
            Diarization::parse,
            &mut diags,
        );

        if diags.has_error() {
            return Err(diags);
        }
        Ok(Self {
            audio_url,
            language,
            operating_point,
            diarization,
        })
    }

    fn job_config(&self) -> JobConfig {
        JobConfig::fetch_transcription(
            self.audio_url.clone(),
            TranscriptionConfig {
                language: self.language.clone(),
                operating_point: self.operating_point,
                diarization: self.diarization,
            },
        )
    }
}

fn job_id(state: &ObjectValue) -> Result<String, Diagnostics> {
    match state.get(ATTR_ID).as_str() {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(Diagnostic::error(
            "Missing job id",
            "The resource state does not contain a Speechmatics job id.",
        )
        .with_attribute(AttributePath::root(ATTR_ID))
        .into()),
    }
}

fn force_delete(state: &ObjectValue) -> bool {
    state.get(ATTR_FORCE_DELETE).as_bool().unwrap_or(false)
}

impl TranscriptionResource {
    /// Copy the job's computed fields onto `state`, fetching the transcript
    /// once the job is done.
    async fn apply_job(
        &self,
        client: &SpeechmaticsClient,
        mut state: ObjectValue,
        job: JobDetails,
    ) -> Result<ObjectValue, Diagnostics> {
        let transcript = if job.status == JobStatus::Done {
            let text = client
                .get_transcript(&job.id)
                .await
                .map_err(|e| Diagnostics::from(e.to_diagnostic("Unable to read transcript")))?;
            Value::from(text)
        } else {
            Value::Null
        };

        state.set(ATTR_ID, job.id.as_str());
        state.set(ATTR_STATUS, job.status.as_str());
        state.set(ATTR_CREATED_AT, job.created_at.as_str());
        state.set(ATTR_DATA_NAME, job.data_name.as_str());
        state.set(ATTR_DURATION, job.duration_seconds());
        state.set(ATTR_TRANSCRIPT, transcript);
        Ok(state)
    }
}

#[async_trait]
impl Resource for TranscriptionResource {
    fn type_name(&self, provider_type_name: &str) -> String {
        format!("{provider_type_name}_transcription")
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_description("A Speechmatics batch transcription job.")
            .with_attribute(
                ATTR_ID,
                Attribute::computed_string().with_description("Job identifier"),
            )
            .with_attribute(
                ATTR_AUDIO_URL,
                Attribute::required_string()
                    .requires_replace()
                    .with_description("URL of the media file Speechmatics downloads and transcribes"),
            )
            .with_attribute(
                ATTR_LANGUAGE,
                Attribute::required_string()
                    .requires_replace()
                    .with_description("Language code of the audio, e.g. `en`"),
            )
            .with_attribute(
                ATTR_OPERATING_POINT,
                Attribute::optional_string()
                    .requires_replace()
                    .with_description("Model accuracy: `standard` or `enhanced`"),
            )
            .with_attribute(
                ATTR_DIARIZATION,
                Attribute::optional_string()
                    .requires_replace()
                    .with_description("Speaker separation: `none`, `speaker` or `channel`"),
            )
            .with_attribute(
                ATTR_FORCE_DELETE,
                Attribute::optional(AttributeType::Bool)
                    .with_description("Delete the job even while it is still running"),
            )
            .with_attribute(ATTR_STATUS, Attribute::computed_string())
            .with_attribute(ATTR_CREATED_AT, Attribute::computed_string())
            .with_attribute(ATTR_DATA_NAME, Attribute::computed_string())
            .with_attribute(
                ATTR_DURATION,
                Attribute::computed(AttributeType::Int64)
                    .with_description("Media duration in seconds"),
            )
            .with_attribute(
                ATTR_TRANSCRIPT,
                Attribute::computed_string()
                    .with_description("Plain-text transcript, set once the job is done"),
            )
    }

    fn configure(&mut self, provider_data: Option<ProviderData>) -> Diagnostics {
        let (client, diags) = client_from_provider_data(provider_data);
        self.client = client;
        diags
    }

    async fn create(&self, plan: ObjectValue) -> Result<ObjectValue, Diagnostics> {
        let client = require_client(&self.client)?;
        let inputs = TranscriptionPlan::from_plan(&plan)?;
        debug!(?inputs, "Submitting transcription job");

        let id = client
            .create_job(&inputs.job_config())
            .await
            .map_err(|e| Diagnostics::from(e.to_diagnostic("Unable to create transcription job")))?;

        let job = client.get_job(&id).await.map_err(|e| {
            Diagnostics::from(e.to_diagnostic("Unable to read transcription job after create"))
        })?;
        info!(job_id = %id, status = %job.status, "Transcription job created");

        self.apply_job(client, plan, job).await
    }

    async fn read(&self, state: ObjectValue) -> Result<Option<ObjectValue>, Diagnostics> {
        let client = require_client(&self.client)?;
        let id = job_id(&state)?;

        let job = match client.get_job(&id).await {
            Ok(job) => job,
            Err(e) if e.is_not_found() => {
                warn!(job_id = %id, "Transcription job not found, removing from state");
                return Ok(None);
            }
            Err(e) => {
                return Err(e.to_diagnostic("Unable to read transcription job").into());
            }
        };

        if job.status == JobStatus::Deleted {
            warn!(job_id = %id, "Transcription job was deleted, removing from state");
            return Ok(None);
        }

        self.apply_job(client, state, job).await.map(Some)
    }

    async fn update(
        &self,
        prior: ObjectValue,
        plan: ObjectValue,
    ) -> Result<ObjectValue, Diagnostics> {
        let client = require_client(&self.client)?;
        let id = job_id(&prior)?;

        // only force_delete can change in place; nothing to send
        let job = client.get_job(&id).await.map_err(|e| {
            Diagnostics::from(e.to_diagnostic("Unable to read transcription job"))
        })?;
        debug!(job_id = %id, force_delete = force_delete(&plan), "Updated transcription settings");

        self.apply_job(client, plan, job).await
    }

    async fn delete(&self, state: ObjectValue) -> Result<(), Diagnostics> {
        let client = require_client(&self.client)?;
        let id = job_id(&state)?;

        match client.delete_job(&id, force_delete(&state)).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!(job_id = %id, "Transcription job already gone");
                Ok(())
            }
            Err(e) => Err(e.to_diagnostic("Unable to delete transcription job").into()),
        }
    }
}

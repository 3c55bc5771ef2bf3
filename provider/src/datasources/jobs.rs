//! `speechmatics_jobs` data source: recent jobs on the account.

use std::collections::BTreeMap;
use std::sync::Arc;

use speechmatics_plugin_api::{
    Attribute, AttributePath, AttributeType, DataSource, Diagnostics, ObjectValue, ProviderData,
    Schema, Value, async_trait,
};
use tracing::debug;

use crate::provider::{client_from_provider_data, require_client};
use crate::speechmatics::{JobDetails, ListJobsQuery, SpeechmaticsClient};

const ATTR_ID: &str = "id";
const ATTR_LIMIT: &str = "limit";
const ATTR_CREATED_BEFORE: &str = "created_before";
const ATTR_INCLUDE_DELETED: &str = "include_deleted";
const ATTR_JOBS: &str = "jobs";

/// Fixed identifier; the listing has no natural id of its own.
const DATA_SOURCE_ID: &str = "speechmatics_jobs";

#[derive(Default)]
pub struct JobsDataSource {
    client: Option<Arc<SpeechmaticsClient>>,
}

fn job_attributes() -> BTreeMap<String, Attribute> {
    [
        ("id", Attribute::computed_string()),
        ("status", Attribute::computed_string()),
        ("created_at", Attribute::computed_string()),
        ("data_name", Attribute::computed_string()),
        ("job_type", Attribute::computed_string()),
        ("duration", Attribute::computed(AttributeType::Int64)),
        ("language", Attribute::computed_string()),
    ]
    .into_iter()
    .map(|(name, attr)| (name.to_string(), attr))
    .collect()
}

fn job_object(job: &JobDetails) -> Value {
    ObjectValue::new()
        .with("id", job.id.as_str())
        .with("status", job.status.as_str())
        .with("created_at", job.created_at.as_str())
        .with("data_name", job.data_name.as_str())
        .with("job_type", job.job_type().map(|t| t.as_str()))
        .with("duration", job.duration_seconds())
        .with("language", job.language())
        .into()
}

fn list_query(config: &ObjectValue) -> Result<ListJobsQuery, Diagnostics> {
    let limit = config.get(ATTR_LIMIT).as_i64();
    if let Some(limit) = limit {
        if limit <= 0 {
            let mut diags = Diagnostics::new();
            diags.add_attribute_error(
                AttributePath::root(ATTR_LIMIT),
                "Invalid attribute value",
                format!("\"limit\" must be greater than zero, got {limit}."),
            );
            return Err(diags);
        }
    }

    Ok(ListJobsQuery {
        limit,
        created_before: config.get(ATTR_CREATED_BEFORE).as_str().map(str::to_string),
        include_deleted: config.get(ATTR_INCLUDE_DELETED).as_bool(),
    })
}

#[async_trait]
impl DataSource for JobsDataSource {
    fn type_name(&self, provider_type_name: &str) -> String {
        format!("{provider_type_name}_jobs")
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_description("Lists transcription jobs on the Speechmatics account.")
            .with_attribute(ATTR_ID, Attribute::computed_string())
            .with_attribute(
                ATTR_LIMIT,
                Attribute::optional(AttributeType::Int64)
                    .with_description("Maximum number of jobs to return"),
            )
            .with_attribute(
                ATTR_CREATED_BEFORE,
                Attribute::optional_string()
                    .with_description("Only jobs created before this ISO 8601 timestamp"),
            )
            .with_attribute(
                ATTR_INCLUDE_DELETED,
                Attribute::optional(AttributeType::Bool)
                    .with_description("Include deleted jobs"),
            )
            .with_attribute(
                ATTR_JOBS,
                Attribute::computed(AttributeType::ListOfObjects(job_attributes())),
            )
    }

    fn configure(&mut self, provider_data: Option<ProviderData>) -> Diagnostics {
        let (client, diags) = client_from_provider_data(provider_data);
        self.client = client;
        diags
    }

    async fn read(&self, config: ObjectValue) -> Result<ObjectValue, Diagnostics> {
        let client = require_client(&self.client)?;
        let query = list_query(&config)?;

        let jobs = client
            .list_jobs(&query)
            .await
            .map_err(|e| Diagnostics::from(e.to_diagnostic("Unable to list transcription jobs")))?;
        debug!(count = jobs.len(), "Read Speechmatics jobs");

        let mut state = config;
        state.set(ATTR_ID, DATA_SOURCE_ID);
        state.set(ATTR_JOBS, jobs.iter().map(job_object).collect::<Vec<_>>());
        Ok(state)
    }
}

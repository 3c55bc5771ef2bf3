//! Built-in registrations
//!
//! - Resource `speechmatics_transcription`
//! - Data source `speechmatics_jobs`

use speechmatics_plugin_api::{DataSource, Resource};

use crate::datasources::JobsDataSource;
use crate::plugin::registry::PluginConstructor;
use crate::resources::TranscriptionResource;

fn create_transcription_resource() -> Box<dyn Resource> {
    Box::new(TranscriptionResource::default())
}

fn create_jobs_data_source() -> Box<dyn DataSource> {
    Box::new(JobsDataSource::default())
}

inventory::submit! {
    PluginConstructor::resource("transcription", create_transcription_resource)
}

inventory::submit! {
    PluginConstructor::data_source("jobs", create_jobs_data_source)
}

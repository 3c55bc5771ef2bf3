//! Read-only data sources.

pub mod jobs;

pub use jobs::JobsDataSource;

//! Provider, resource and data source traits.
//!
//! The host drives a provider through a fixed sequence: [`Provider::metadata`],
//! [`Provider::schema`], [`Provider::configure`], and only then
//! [`Provider::resources`] / [`Provider::data_sources`]. Data published by
//! `configure` is handed to every resource and data source instance before any
//! CRUD call.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use crate::diagnostics::Diagnostics;
use crate::schema::Schema;
use crate::value::ObjectValue;

/// Shared data published by `configure`, typically an API client.
pub type ProviderData = Arc<dyn Any + Send + Sync>;

/// Constructor for a resource implementation.
pub type ResourceFactory = fn() -> Box<dyn Resource>;

/// Constructor for a data source implementation.
pub type DataSourceFactory = fn() -> Box<dyn DataSource>;

/// Recover the concrete type of published provider data.
pub fn downcast_provider_data<T: Any + Send + Sync>(data: &ProviderData) -> Option<Arc<T>> {
    Arc::clone(data).downcast::<T>().ok()
}

/// Provider identity reported to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMetadata {
    /// Prefix of every resource and data source type name.
    pub type_name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigureRequest {
    /// Raw provider block, already validated against the provider schema.
    pub config: ObjectValue,
}

#[derive(Default)]
pub struct ConfigureResponse {
    pub diagnostics: Diagnostics,
    /// Data handed to resources. `None` leaves them unconfigured.
    pub resource_data: Option<ProviderData>,
    /// Data handed to data sources. `None` leaves them unconfigured.
    pub data_source_data: Option<ProviderData>,
}

impl std::fmt::Debug for ConfigureResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigureResponse")
            .field("diagnostics", &self.diagnostics)
            .field("resource_data", &self.resource_data.is_some())
            .field("data_source_data", &self.data_source_data.is_some())
            .finish()
    }
}

#[async_trait]
pub trait Provider: Send + Sync {
    fn metadata(&self) -> ProviderMetadata;

    fn schema(&self) -> Schema;

    async fn configure(&self, request: ConfigureRequest) -> ConfigureResponse;

    fn resources(&self) -> Vec<ResourceFactory>;

    fn data_sources(&self) -> Vec<DataSourceFactory>;
}

/// A managed entity with a create / read / update / delete lifecycle.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Full type name, built from the provider type name.
    fn type_name(&self, provider_type_name: &str) -> String;

    fn schema(&self) -> Schema;

    /// Receive the data published by provider configure.
    fn configure(&mut self, provider_data: Option<ProviderData>) -> Diagnostics;

    /// Create the remote object from a plan and return the new state.
    async fn create(&self, plan: ObjectValue) -> Result<ObjectValue, Diagnostics>;

    /// Refresh state. `Ok(None)` means the remote object is gone.
    async fn read(&self, state: ObjectValue) -> Result<Option<ObjectValue>, Diagnostics>;

    async fn update(&self, prior: ObjectValue, plan: ObjectValue)
    -> Result<ObjectValue, Diagnostics>;

    async fn delete(&self, state: ObjectValue) -> Result<(), Diagnostics>;
}

/// A read-only query.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self, provider_type_name: &str) -> String;

    fn schema(&self) -> Schema;

    fn configure(&mut self, provider_data: Option<ProviderData>) -> Diagnostics;

    async fn read(&self, config: ObjectValue) -> Result<ObjectValue, Diagnostics>;
}

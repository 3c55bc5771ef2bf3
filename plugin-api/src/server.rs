//! Lifecycle server
//!
//! [`ProviderServer`] plays the host side of the contract for a single
//! session. It enforces the call order (configure before any resource or data
//! source operation), validates configuration against schemas, instantiates and
//! configures every resource and data source once provider configure
//! succeeds, and dispatches CRUD calls by type name.
//!
//! Instances are kept in `DashMap`s so concurrent operations on different
//! resources never contend on a single lock.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::PluginError;
use crate::provider::{ConfigureRequest, DataSource, Provider, ProviderMetadata, Resource};
use crate::schema::Schema;
use crate::value::ObjectValue;

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Configure has not succeeded yet.
    Unconfigured,
    /// Resources and data sources are instantiated and configured.
    Configured,
}

pub struct ProviderServer<P> {
    provider: P,
    metadata: ProviderMetadata,
    state: RwLock<LifecycleState>,
    resources: DashMap<String, Arc<dyn Resource>>,
    data_sources: DashMap<String, Arc<dyn DataSource>>,
}

impl<P: Provider> ProviderServer<P> {
    pub fn new(provider: P) -> Self {
        let metadata = provider.metadata();
        debug!(
            provider = %metadata.type_name,
            version = %metadata.version,
            "Provider server created"
        );
        Self {
            provider,
            metadata,
            state: RwLock::new(LifecycleState::Unconfigured),
            resources: DashMap::new(),
            data_sources: DashMap::new(),
        }
    }

    pub fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.read()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_schema(&self) -> Schema {
        self.provider.schema()
    }

    /// Schemas of every resource type, keyed by full type name.
    ///
    /// Available before configure; instances built here are discarded.
    pub fn resource_schemas(&self) -> BTreeMap<String, Schema> {
        self.provider
            .resources()
            .into_iter()
            .map(|factory| {
                let resource = factory();
                (resource.type_name(&self.metadata.type_name), resource.schema())
            })
            .collect()
    }

    /// Schemas of every data source type, keyed by full type name.
    pub fn data_source_schemas(&self) -> BTreeMap<String, Schema> {
        self.provider
            .data_sources()
            .into_iter()
            .map(|factory| {
                let data_source = factory();
                (
                    data_source.type_name(&self.metadata.type_name),
                    data_source.schema(),
                )
            })
            .collect()
    }

    /// Drop every configured instance and return to
    /// [`LifecycleState::Unconfigured`].
    fn unpublish(&self) {
        *self.state.write() = LifecycleState::Unconfigured;
        self.resources.clear();
        self.data_sources.clear();
    }

    /// Validate and apply the provider block.
    ///
    /// On success the session moves to [`LifecycleState::Configured`]. Calling
    /// configure again re-instantiates every resource and data source; if that
    /// call fails, instances from the earlier configure are dropped and the
    /// session is [`LifecycleState::Unconfigured`] again.
    pub async fn configure(&self, config: ObjectValue) -> Diagnostics {
        let schema = self.provider.schema();
        debug!(
            provider = %self.metadata.type_name,
            config = %schema.redact(&config).to_json(),
            "Configuring provider"
        );
        let mut diags = schema.validate_config(&config);
        if diags.has_error() {
            warn!(
                provider = %self.metadata.type_name,
                errors = diags.errors().count(),
                "Provider configuration failed schema validation"
            );
            self.unpublish();
            return diags;
        }

        let response = self
            .provider
            .configure(ConfigureRequest { config })
            .await;
        diags.append(response.diagnostics);
        if diags.has_error() {
            warn!(provider = %self.metadata.type_name, "Provider configure returned errors");
            self.unpublish();
            return diags;
        }

        let resources: DashMap<String, Arc<dyn Resource>> = DashMap::new();
        for factory in self.provider.resources() {
            let mut resource = factory();
            let type_name = resource.type_name(&self.metadata.type_name);
            diags.append(resource.configure(response.resource_data.clone()));
            if resources
                .insert(type_name.clone(), Arc::from(resource))
                .is_some()
            {
                diags.push(PluginError::DuplicateTypeName(type_name).into());
            }
        }

        let data_sources: DashMap<String, Arc<dyn DataSource>> = DashMap::new();
        for factory in self.provider.data_sources() {
            let mut data_source = factory();
            let type_name = data_source.type_name(&self.metadata.type_name);
            diags.append(data_source.configure(response.data_source_data.clone()));
            if data_sources
                .insert(type_name.clone(), Arc::from(data_source))
                .is_some()
            {
                diags.push(PluginError::DuplicateTypeName(type_name).into());
            }
        }

        if diags.has_error() {
            self.unpublish();
            return diags;
        }

        self.resources.clear();
        self.data_sources.clear();
        for (name, resource) in resources {
            self.resources.insert(name, resource);
        }
        for (name, data_source) in data_sources {
            self.data_sources.insert(name, data_source);
        }
        *self.state.write() = LifecycleState::Configured;

        info!(
            provider = %self.metadata.type_name,
            resources = self.resources.len(),
            data_sources = self.data_sources.len(),
            "Provider configured"
        );
        diags
    }

    fn ensure_configured(&self) -> Result<(), Diagnostics> {
        match self.state() {
            LifecycleState::Configured => Ok(()),
            LifecycleState::Unconfigured => Err(Diagnostic::from(PluginError::NotConfigured).into()),
        }
    }

    fn resource(&self, type_name: &str) -> Result<Arc<dyn Resource>, Diagnostics> {
        self.ensure_configured()?;
        self.resources
            .get(type_name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| {
                Diagnostic::from(PluginError::UnknownResourceType(type_name.to_string())).into()
            })
    }

    fn data_source(&self, type_name: &str) -> Result<Arc<dyn DataSource>, Diagnostics> {
        self.ensure_configured()?;
        self.data_sources
            .get(type_name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| {
                Diagnostic::from(PluginError::UnknownDataSourceType(type_name.to_string())).into()
            })
    }

    fn validate_plan(schema: &Schema, plan: &ObjectValue) -> Result<(), Diagnostics> {
        let diags = schema.validate_config(&schema.config_view(plan));
        if diags.has_error() { Err(diags) } else { Ok(()) }
    }

    pub async fn create_resource(
        &self,
        type_name: &str,
        plan: ObjectValue,
    ) -> Result<ObjectValue, Diagnostics> {
        let resource = self.resource(type_name)?;
        Self::validate_plan(&resource.schema(), &plan)?;
        info!(resource = %type_name, "Creating resource");
        resource.create(plan).await
    }

    pub async fn read_resource(
        &self,
        type_name: &str,
        state: ObjectValue,
    ) -> Result<Option<ObjectValue>, Diagnostics> {
        let resource = self.resource(type_name)?;
        debug!(resource = %type_name, "Reading resource");
        let refreshed = resource.read(state).await?;
        if refreshed.is_none() {
            info!(resource = %type_name, "Resource no longer exists remotely");
        }
        Ok(refreshed)
    }

    /// Update in place. Changes to `requires_replace` attributes are rejected;
    /// the caller must delete and create instead.
    pub async fn update_resource(
        &self,
        type_name: &str,
        prior: ObjectValue,
        plan: ObjectValue,
    ) -> Result<ObjectValue, Diagnostics> {
        let resource = self.resource(type_name)?;
        let schema = resource.schema();
        Self::validate_plan(&schema, &plan)?;

        let replace =
            schema.replace_attributes(&schema.config_view(&prior), &schema.config_view(&plan));
        if !replace.is_empty() {
            return Err(Diagnostic::from(PluginError::RequiresReplace(replace)).into());
        }

        info!(resource = %type_name, "Updating resource");
        resource.update(prior, plan).await
    }

    pub async fn delete_resource(
        &self,
        type_name: &str,
        state: ObjectValue,
    ) -> Result<(), Diagnostics> {
        let resource = self.resource(type_name)?;
        info!(resource = %type_name, "Deleting resource");
        resource.delete(state).await
    }

    pub async fn read_data_source(
        &self,
        type_name: &str,
        config: ObjectValue,
    ) -> Result<ObjectValue, Diagnostics> {
        let data_source = self.data_source(type_name)?;
        let diags = data_source.schema().validate_config(&config);
        if diags.has_error() {
            return Err(diags);
        }
        debug!(data_source = %type_name, "Reading data source");
        data_source.read(config).await
    }
}

//! Resource and data source registry
//!
//! Resource and data source types are registered at compile time with the
//! `inventory` crate and indexed by their type suffix (the part after
//! `speechmatics_`).
//!
//! # Usage
//!
//! ```ignore
//! use speechmatics_provider::plugin::global_registry;
//!
//! let factories = global_registry().resource_factories();
//! ```

use std::sync::OnceLock;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use speechmatics_plugin_api::{DataSourceFactory, PluginError, ResourceFactory};

/// Which kind of type a constructor produces.
#[derive(Clone, Copy)]
pub enum ConstructorKind {
    Resource(ResourceFactory),
    DataSource(DataSourceFactory),
}

/// Constructor for inventory-based registration.
pub struct PluginConstructor {
    /// Type suffix, e.g. `transcription` for `speechmatics_transcription`.
    pub type_suffix: &'static str,
    pub kind: ConstructorKind,
}

impl PluginConstructor {
    pub const fn resource(type_suffix: &'static str, factory: ResourceFactory) -> Self {
        Self {
            type_suffix,
            kind: ConstructorKind::Resource(factory),
        }
    }

    pub const fn data_source(type_suffix: &'static str, factory: DataSourceFactory) -> Self {
        Self {
            type_suffix,
            kind: ConstructorKind::DataSource(factory),
        }
    }
}

// Collect all registered constructors at link time
inventory::collect!(PluginConstructor);

/// Index of resource and data source constructors.
#[derive(Default)]
pub struct PluginRegistry {
    resources: DashMap<String, ResourceFactory>,
    data_sources: DashMap<String, DataSourceFactory>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource constructor. Type suffixes are unique.
    pub fn register_resource(
        &self,
        type_suffix: &str,
        factory: ResourceFactory,
    ) -> Result<(), PluginError> {
        match self.resources.entry(type_suffix.to_string()) {
            Entry::Occupied(_) => Err(PluginError::DuplicateTypeName(type_suffix.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(factory);
                Ok(())
            }
        }
    }

    /// Register a data source constructor. Type suffixes are unique.
    pub fn register_data_source(
        &self,
        type_suffix: &str,
        factory: DataSourceFactory,
    ) -> Result<(), PluginError> {
        match self.data_sources.entry(type_suffix.to_string()) {
            Entry::Occupied(_) => Err(PluginError::DuplicateTypeName(type_suffix.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(factory);
                Ok(())
            }
        }
    }

    /// Resource constructors, ordered by type suffix.
    pub fn resource_factories(&self) -> Vec<ResourceFactory> {
        let mut entries: Vec<(String, ResourceFactory)> = self
            .resources
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.into_iter().map(|(_, f)| f).collect()
    }

    /// Data source constructors, ordered by type suffix.
    pub fn data_source_factories(&self) -> Vec<DataSourceFactory> {
        let mut entries: Vec<(String, DataSourceFactory)> = self
            .data_sources
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.into_iter().map(|(_, f)| f).collect()
    }

    pub fn resource_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.resources.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn data_source_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.data_sources.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn has_resource(&self, type_suffix: &str) -> bool {
        self.resources.contains_key(type_suffix)
    }

    pub fn has_data_source(&self, type_suffix: &str) -> bool {
        self.data_sources.contains_key(type_suffix)
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn data_source_count(&self) -> usize {
        self.data_sources.len()
    }
}

/// Global registry instance
static GLOBAL_REGISTRY: OnceLock<PluginRegistry> = OnceLock::new();

/// Get the global registry.
///
/// Lazily populated from every `inventory::submit!` of [`PluginConstructor`].
/// A duplicate suffix keeps the first registration and logs the rest.
pub fn global_registry() -> &'static PluginRegistry {
    GLOBAL_REGISTRY.get_or_init(|| {
        let registry = PluginRegistry::new();

        for constructor in inventory::iter::<PluginConstructor> {
            let result = match constructor.kind {
                ConstructorKind::Resource(factory) => {
                    registry.register_resource(constructor.type_suffix, factory)
                }
                ConstructorKind::DataSource(factory) => {
                    registry.register_data_source(constructor.type_suffix, factory)
                }
            };
            if let Err(e) = result {
                tracing::warn!(
                    type_suffix = constructor.type_suffix,
                    error = %e,
                    "Skipping duplicate registration"
                );
            }
        }

        tracing::debug!(
            resource_count = registry.resource_count(),
            data_source_count = registry.data_source_count(),
            "Registry initialized"
        );

        registry
    })
}

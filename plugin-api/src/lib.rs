//! # Speechmatics Plugin API
//!
//! This crate defines the host lifecycle contract the Speechmatics provider is
//! written against: attribute values, schemas, diagnostics, and the
//! [`Provider`], [`Resource`] and [`DataSource`] traits.
//!
//! # Lifecycle
//!
//! ```text
//! Metadata ──▶ Schema ──▶ Configure ──▶ Resources / DataSources ──▶ CRUD
//!                            │
//!                            └─ publishes ProviderData (e.g. an API client)
//! ```
//!
//! The wire protocol between the infrastructure tool and the plugin process is
//! owned by the host. [`ProviderServer`] drives the same lifecycle in-process,
//! which is what the provider binary and the tests use.
//!
//! # Example
//!
//! ```rust,ignore
//! use speechmatics_plugin_api::{ObjectValue, ProviderServer};
//!
//! let server = ProviderServer::new(MyProvider::new("dev"));
//! let diags = server.configure(ObjectValue::new().with("api_key", "...")).await;
//! assert!(!diags.has_error());
//! let state = server.create_resource("my_thing", plan).await?;
//! ```

pub mod diagnostics;
pub mod error;
pub mod provider;
pub mod schema;
pub mod server;
pub mod value;

pub use async_trait::async_trait;

pub use diagnostics::{AttributePath, Diagnostic, Diagnostics, Severity};
pub use error::PluginError;
pub use provider::{
    ConfigureRequest, ConfigureResponse, DataSource, DataSourceFactory, Provider,
    ProviderData, ProviderMetadata, Resource, ResourceFactory, downcast_provider_data,
};
pub use schema::{Attribute, AttributeType, SENSITIVE_PLACEHOLDER, Schema};
pub use server::{LifecycleState, ProviderServer};
pub use value::{ObjectValue, StringValue, Value};

//! Lifecycle tests for ProviderServer
//!
//! A small in-memory provider exercises call ordering, schema validation,
//! publication of provider data and CRUD dispatch.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use speechmatics_plugin_api::{
    Attribute, AttributeType, ConfigureRequest, ConfigureResponse, DataSource,
    DataSourceFactory, Diagnostics, LifecycleState, ObjectValue, Provider, ProviderData,
    ProviderMetadata, ProviderServer, Resource, ResourceFactory, Schema, Value, async_trait,
    downcast_provider_data,
};

/// Shared "client" published by configure.
struct Counter {
    next_id: AtomicU64,
    prefix: String,
}

struct MemoryProvider;

#[async_trait]
impl Provider for MemoryProvider {
    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            type_name: "memory".to_string(),
            version: "test".to_string(),
        }
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("prefix", Attribute::optional_string())
            .with_attribute("token", Attribute::required_string().sensitive())
    }

    async fn configure(&self, request: ConfigureRequest) -> ConfigureResponse {
        let mut response = ConfigureResponse::default();
        let token = request.config.get("token").as_str().unwrap_or_default();
        if token == "bad" {
            response.diagnostics.add_error("Invalid token", "token rejected");
            return response;
        }
        if token == "silent" {
            // configure succeeds but publishes nothing
            return response;
        }
        let client: ProviderData = Arc::new(Counter {
            next_id: AtomicU64::new(1),
            prefix: request
                .config
                .get("prefix")
                .as_str()
                .unwrap_or("item")
                .to_string(),
        });
        response.resource_data = Some(client.clone());
        response.data_source_data = Some(client);
        response
    }

    fn resources(&self) -> Vec<ResourceFactory> {
        vec![new_item_resource as ResourceFactory]
    }

    fn data_sources(&self) -> Vec<DataSourceFactory> {
        vec![new_counter_data_source as DataSourceFactory]
    }
}

fn new_item_resource() -> Box<dyn Resource> {
    Box::new(ItemResource::default())
}

fn new_counter_data_source() -> Box<dyn DataSource> {
    Box::new(CounterDataSource::default())
}

#[derive(Default)]
struct ItemResource {
    counter: Option<Arc<Counter>>,
}

impl ItemResource {
    fn counter(&self) -> Result<&Counter, Diagnostics> {
        self.counter.as_deref().ok_or_else(|| {
            let mut diags = Diagnostics::new();
            diags.add_error("Unconfigured client", "no client published");
            diags
        })
    }
}

#[async_trait]
impl Resource for ItemResource {
    fn type_name(&self, provider_type_name: &str) -> String {
        format!("{provider_type_name}_item")
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string().requires_replace())
            .with_attribute("note", Attribute::optional_string())
    }

    fn configure(&mut self, provider_data: Option<ProviderData>) -> Diagnostics {
        self.counter = provider_data.and_then(|d| downcast_provider_data::<Counter>(&d));
        Diagnostics::new()
    }

    async fn create(&self, plan: ObjectValue) -> Result<ObjectValue, Diagnostics> {
        let counter = self.counter()?;
        let id = counter.next_id.fetch_add(1, Ordering::SeqCst);
        let mut state = plan;
        state.set("id", format!("{}-{id}", counter.prefix));
        Ok(state)
    }

    async fn read(&self, state: ObjectValue) -> Result<Option<ObjectValue>, Diagnostics> {
        self.counter()?;
        if state.get("name").as_str() == Some("gone") {
            return Ok(None);
        }
        Ok(Some(state))
    }

    async fn update(
        &self,
        prior: ObjectValue,
        plan: ObjectValue,
    ) -> Result<ObjectValue, Diagnostics> {
        self.counter()?;
        let mut state = plan;
        state.set("id", prior.get("id").clone());
        Ok(state)
    }

    async fn delete(&self, _state: ObjectValue) -> Result<(), Diagnostics> {
        self.counter()?;
        Ok(())
    }
}

#[derive(Default)]
struct CounterDataSource {
    counter: Option<Arc<Counter>>,
}

#[async_trait]
impl DataSource for CounterDataSource {
    fn type_name(&self, provider_type_name: &str) -> String {
        format!("{provider_type_name}_counter")
    }

    fn schema(&self) -> Schema {
        Schema::new().with_attribute("next", Attribute::computed(AttributeType::Int64))
    }

    fn configure(&mut self, provider_data: Option<ProviderData>) -> Diagnostics {
        self.counter = provider_data.and_then(|d| downcast_provider_data::<Counter>(&d));
        Diagnostics::new()
    }

    async fn read(&self, _config: ObjectValue) -> Result<ObjectValue, Diagnostics> {
        let next = self
            .counter
            .as_ref()
            .map(|c| c.next_id.load(Ordering::SeqCst) as i64)
            .unwrap_or_default();
        Ok(ObjectValue::new().with("next", next))
    }
}

fn valid_config() -> ObjectValue {
    ObjectValue::new().with("token", "good").with("prefix", "thing")
}

#[tokio::test]
async fn test_operations_before_configure_fail() {
    let server = ProviderServer::new(MemoryProvider);
    assert_eq!(server.state(), LifecycleState::Unconfigured);

    let err = server
        .create_resource("memory_item", ObjectValue::new().with("name", "a"))
        .await
        .unwrap_err();
    assert_eq!(err.errors().next().unwrap().summary, "Unconfigured provider");
}

#[tokio::test]
async fn test_schemas_available_before_configure() {
    let server = ProviderServer::new(MemoryProvider);
    let resources = server.resource_schemas();
    assert!(resources.contains_key("memory_item"));
    let data_sources = server.data_source_schemas();
    assert!(data_sources.contains_key("memory_counter"));
}

#[tokio::test]
async fn test_configure_rejects_missing_required() {
    let server = ProviderServer::new(MemoryProvider);
    let diags = server.configure(ObjectValue::new()).await;
    assert!(diags.has_error());
    assert_eq!(server.state(), LifecycleState::Unconfigured);
}

#[tokio::test]
async fn test_provider_error_keeps_session_unconfigured() {
    let server = ProviderServer::new(MemoryProvider);
    let diags = server
        .configure(ObjectValue::new().with("token", "bad"))
        .await;
    assert!(diags.has_error());
    assert_eq!(server.state(), LifecycleState::Unconfigured);
}

#[tokio::test]
async fn test_failed_reconfigure_drops_instances() {
    let server = ProviderServer::new(MemoryProvider);
    assert!(!server.configure(valid_config()).await.has_error());
    assert_eq!(server.state(), LifecycleState::Configured);

    // provider rejects the new block
    assert!(server.configure(ObjectValue::new().with("token", "bad")).await.has_error());
    assert_eq!(server.state(), LifecycleState::Unconfigured);
    let err = server
        .read_data_source("memory_counter", ObjectValue::new())
        .await
        .unwrap_err();
    assert_eq!(err.errors().next().unwrap().summary, "Unconfigured provider");

    // schema rejects the new block
    assert!(!server.configure(valid_config()).await.has_error());
    assert!(server.configure(ObjectValue::new()).await.has_error());
    assert_eq!(server.state(), LifecycleState::Unconfigured);
    let err = server
        .create_resource("memory_item", ObjectValue::new().with("name", "a"))
        .await
        .unwrap_err();
    assert_eq!(err.errors().next().unwrap().summary, "Unconfigured provider");
}

#[tokio::test]
async fn test_create_read_update_delete() {
    let server = ProviderServer::new(MemoryProvider);
    assert!(!server.configure(valid_config()).await.has_error());
    assert_eq!(server.state(), LifecycleState::Configured);

    let state = server
        .create_resource("memory_item", ObjectValue::new().with("name", "a"))
        .await
        .unwrap();
    assert_eq!(state.get("id").as_str(), Some("thing-1"));

    let refreshed = server
        .read_resource("memory_item", state.clone())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed, state);

    let mut plan = state.clone();
    plan.set("note", "hello");
    let updated = server
        .update_resource("memory_item", state.clone(), plan)
        .await
        .unwrap();
    assert_eq!(updated.get("note").as_str(), Some("hello"));
    assert_eq!(updated.get("id").as_str(), Some("thing-1"));

    server.delete_resource("memory_item", updated).await.unwrap();
}

#[tokio::test]
async fn test_read_reports_removed_resource() {
    let server = ProviderServer::new(MemoryProvider);
    server.configure(valid_config()).await;

    let state = ObjectValue::new().with("id", "x").with("name", "gone");
    assert!(server.read_resource("memory_item", state).await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_of_replace_attribute_is_rejected() {
    let server = ProviderServer::new(MemoryProvider);
    server.configure(valid_config()).await;

    let prior = ObjectValue::new().with("id", "thing-1").with("name", "a");
    let plan = ObjectValue::new().with("id", "thing-1").with("name", "b");
    let err = server
        .update_resource("memory_item", prior, plan)
        .await
        .unwrap_err();
    let d = err.errors().next().unwrap();
    assert_eq!(d.summary, "Resource requires replacement");
    assert!(d.detail.contains("name"));
}

#[tokio::test]
async fn test_create_validates_plan() {
    let server = ProviderServer::new(MemoryProvider);
    server.configure(valid_config()).await;

    // computed id in the plan is ignored; the missing name is not
    let plan = ObjectValue::new().with("id", Value::Unknown);
    let err = server.create_resource("memory_item", plan).await.unwrap_err();
    assert_eq!(err.errors().next().unwrap().summary, "Missing required argument");
}

#[tokio::test]
async fn test_unknown_type_names() {
    let server = ProviderServer::new(MemoryProvider);
    server.configure(valid_config()).await;

    let err = server
        .read_resource("memory_nope", ObjectValue::new())
        .await
        .unwrap_err();
    assert_eq!(err.errors().next().unwrap().summary, "Unknown resource type");

    let err = server
        .read_data_source("memory_nope", ObjectValue::new())
        .await
        .unwrap_err();
    assert_eq!(err.errors().next().unwrap().summary, "Unknown data source type");
}

#[tokio::test]
async fn test_data_source_read() {
    let server = ProviderServer::new(MemoryProvider);
    server.configure(valid_config()).await;

    let result = server
        .read_data_source("memory_counter", ObjectValue::new())
        .await
        .unwrap();
    assert_eq!(result.get("next").as_i64(), Some(1));
}

#[tokio::test]
async fn test_unpublished_data_surfaces_as_diagnostic() {
    let server = ProviderServer::new(MemoryProvider);
    let diags = server
        .configure(ObjectValue::new().with("token", "silent"))
        .await;
    assert!(!diags.has_error());

    let err = server
        .create_resource("memory_item", ObjectValue::new().with("name", "a"))
        .await
        .unwrap_err();
    assert_eq!(err.errors().next().unwrap().summary, "Unconfigured client");
}

//! Resource and data source handlers exposed to the host.
//!
//! Handlers are registered as zero-argument factories. The provider creates a
//! fresh handler for each operation and hands it the shared client through
//! `configure` before invoking it.

use serde_json::Value;

use crate::client::ClientHandle;
use crate::data_sources::cluster_type::new_cluster_type_data_source;
use crate::error::ProviderError;
use crate::schema::{Diagnostic, Schema};
use crate::types::PlanResult;
use crate::validation::validate;

/// A read-only view of NetBox objects.
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    /// Fully qualified type name, e.g. `netbox_cluster_type`.
    fn type_name(&self) -> &'static str;

    /// Schema of the data source's configuration and state.
    fn schema(&self) -> Schema;

    /// Receive the shared NetBox client.
    fn configure(&mut self, client: ClientHandle);

    /// Validate the data source configuration against its schema.
    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        validate(&self.schema(), config)
    }

    /// Read the data source state.
    async fn read(&self, config: Value) -> Result<Value, ProviderError>;
}

/// A NetBox object under full lifecycle management.
#[async_trait::async_trait]
pub trait Resource: Send + Sync {
    /// Fully qualified type name, e.g. `netbox_site`.
    fn type_name(&self) -> &'static str;

    /// Schema of the resource's configuration and state.
    fn schema(&self) -> Schema;

    /// Receive the shared NetBox client.
    fn configure(&mut self, client: ClientHandle);

    /// Validate the resource configuration against its schema.
    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        validate(&self.schema(), config)
    }

    /// Plan changes for the resource.
    async fn plan(
        &self,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create the resource.
    async fn create(&self, planned_state: Value) -> Result<Value, ProviderError>;

    /// Read the current state of the resource.
    async fn read(&self, current_state: Value) -> Result<Value, ProviderError>;

    /// Update the resource.
    async fn update(&self, prior_state: Value, planned_state: Value)
        -> Result<Value, ProviderError>;

    /// Delete the resource.
    async fn delete(&self, current_state: Value) -> Result<(), ProviderError>;
}

/// Creates a data source handler.
pub type DataSourceFactory = fn() -> Box<dyn DataSource>;

/// Creates a resource handler.
pub type ResourceFactory = fn() -> Box<dyn Resource>;

/// The handler catalog a provider exposes.
#[derive(Clone, Default)]
pub struct Registry {
    data_sources: Vec<DataSourceFactory>,
    resources: Vec<ResourceFactory>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The handlers shipped with this provider.
    pub fn builtin() -> Self {
        Self::new().with_data_source(new_cluster_type_data_source)
    }

    /// Register a data source factory.
    pub fn with_data_source(mut self, factory: DataSourceFactory) -> Self {
        self.data_sources.push(factory);
        self
    }

    /// Register a resource factory.
    pub fn with_resource(mut self, factory: ResourceFactory) -> Self {
        self.resources.push(factory);
        self
    }

    /// Registered data source factories.
    pub fn data_sources(&self) -> &[DataSourceFactory] {
        &self.data_sources
    }

    /// Registered resource factories.
    pub fn resources(&self) -> &[ResourceFactory] {
        &self.resources
    }

    /// Instantiate the data source registered as `type_name`.
    pub fn data_source(&self, type_name: &str) -> Option<Box<dyn DataSource>> {
        self.data_sources
            .iter()
            .map(|factory| factory())
            .find(|ds| ds.type_name() == type_name)
    }

    /// Instantiate the resource registered as `type_name`.
    pub fn resource(&self, type_name: &str) -> Option<Box<dyn Resource>> {
        self.resources
            .iter()
            .map(|factory| factory())
            .find(|r| r.type_name() == type_name)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data_sources: Vec<_> = self
            .data_sources
            .iter()
            .map(|factory| factory().type_name())
            .collect();
        let resources: Vec<_> = self
            .resources
            .iter()
            .map(|factory| factory().type_name())
            .collect();
        f.debug_struct("Registry")
            .field("data_sources", &data_sources)
            .field("resources", &resources)
            .finish()
    }
}

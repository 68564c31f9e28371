//! The NetBox provider.
//!
//! [`NetboxProvider`] resolves the provider configuration, constructs the
//! NetBox API client and dispatches resource and data source operations to
//! the handlers in its [`Registry`].

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::client::{bootstrap, ClientHandle};
use crate::config::{provider_config_schema, resolve, ConfigurationInput, Resolution};
use crate::env::{EnvLookup, ProcessEnv};
use crate::error::ProviderError;
use crate::registry::{DataSource, Registry, Resource};
use crate::schema::{Diagnostic, ProviderSchema};
use crate::service::ProviderService;
use crate::types::{PlanResult, ProviderMetadata};
use crate::validation::validate;

/// Provider type name reported to the host.
pub const TYPE_NAME: &str = "netbox";

/// Provider for managing NetBox objects.
pub struct NetboxProvider {
    // Set to the release version, "dev" for local builds and "test" under test.
    version: String,
    env: Arc<dyn EnvLookup>,
    registry: Registry,
    client: RwLock<Option<ClientHandle>>,
}

impl NetboxProvider {
    /// Create a provider reading fallbacks from the process environment.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            env: Arc::new(ProcessEnv),
            registry: Registry::builtin(),
            client: RwLock::new(None),
        }
    }

    /// Read environment fallbacks from `env` instead of the process environment.
    pub fn with_env(mut self, env: impl EnvLookup + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Replace the handler catalog.
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// The provider version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The client published by the last successful configure, if any.
    pub async fn client(&self) -> Option<ClientHandle> {
        self.client.read().await.clone()
    }

    async fn data_source(&self, type_name: &str) -> Result<Box<dyn DataSource>, ProviderError> {
        let mut handler = self.registry.data_source(type_name).ok_or_else(|| {
            ProviderError::UnknownResource(format!("Unknown data source type: {}", type_name))
        })?;
        if let Some(client) = self.client().await {
            handler.configure(client);
        }
        Ok(handler)
    }

    async fn resource(&self, type_name: &str) -> Result<Box<dyn Resource>, ProviderError> {
        let mut handler = self.registry.resource(type_name).ok_or_else(|| {
            ProviderError::UnknownResource(format!("Unknown resource type: {}", type_name))
        })?;
        if let Some(client) = self.client().await {
            handler.configure(client);
        }
        Ok(handler)
    }
}

impl std::fmt::Debug for NetboxProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetboxProvider")
            .field("version", &self.version)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl ProviderService for NetboxProvider {
    fn schema(&self) -> ProviderSchema {
        let mut schema = ProviderSchema::new().with_provider_config(provider_config_schema());
        for factory in self.registry.data_sources() {
            let handler = factory();
            schema = schema.with_data_source(handler.type_name(), handler.schema());
        }
        for factory in self.registry.resources() {
            let handler = factory();
            schema = schema.with_resource(handler.type_name(), handler.schema());
        }
        schema
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            type_name: TYPE_NAME.to_string(),
            version: self.version.clone(),
            resources: self
                .registry
                .resources()
                .iter()
                .map(|factory| factory().type_name().to_string())
                .collect(),
            data_sources: self
                .registry
                .data_sources()
                .iter()
                .map(|factory| factory().type_name().to_string())
                .collect(),
        }
    }

    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validate(&provider_config_schema(), &config))
    }

    #[instrument(skip(self, config), fields(version = %self.version))]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        // A failed configure must not leave the previous client reachable.
        *self.client.write().await = None;

        let input = match ConfigurationInput::from_json(&config) {
            Ok(input) => input,
            Err(diagnostics) => {
                warn!(
                    diagnostics = diagnostics.len(),
                    "provider configuration has type errors"
                );
                return Ok(diagnostics);
            },
        };

        let Resolution {
            config,
            mut advisories,
        } = match resolve(&input, &*self.env) {
            Ok(resolution) => resolution,
            Err(failures) => {
                for failure in &failures {
                    warn!(
                        field = %failure.field,
                        kind = ?failure.kind,
                        "provider configuration invalid"
                    );
                }
                return Ok(failures.iter().map(|f| f.to_diagnostic()).collect());
            },
        };

        for advisory in &advisories {
            warn!(summary = %advisory.summary, "provider configuration advisory");
        }
        debug!(
            server_url = %config.server_url,
            strip_trailing_slashes_from_url = config.strip_trailing_slashes_from_url,
            "provider configuration resolved"
        );

        match bootstrap(config) {
            Ok(client) => {
                info!(server_url = %client.server_url(), "NetBox API client configured");
                *self.client.write().await = Some(client);
            },
            Err(e) => {
                error!(error = %e, "failed to create NetBox API client");
                advisories.push(e.to_diagnostic());
            },
        }

        Ok(advisories)
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(self.resource(resource_type).await?.validate(&config))
    }

    #[instrument(skip(self, prior_state, proposed_state, config))]
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.resource(resource_type)
            .await?
            .plan(prior_state, proposed_state, config)
            .await
    }

    #[instrument(skip(self, planned_state))]
    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.resource(resource_type)
            .await?
            .create(planned_state)
            .await
    }

    #[instrument(skip(self, current_state))]
    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        self.resource(resource_type)
            .await?
            .read(current_state)
            .await
    }

    #[instrument(skip(self, prior_state, planned_state))]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.resource(resource_type)
            .await?
            .update(prior_state, planned_state)
            .await
    }

    #[instrument(skip(self, current_state))]
    async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.resource(resource_type)
            .await?
            .delete(current_state)
            .await
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(self.data_source(data_source_type).await?.validate(&config))
    }

    #[instrument(skip(self, config))]
    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.data_source(data_source_type).await?.read(config).await
    }
}

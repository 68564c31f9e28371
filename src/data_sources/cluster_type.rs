//! `netbox_cluster_type` data source.
//!
//! Looks up a single virtualization cluster type by its exact name.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::client::ClientHandle;
use crate::error::ProviderError;
use crate::registry::DataSource;
use crate::schema::{Attribute, Schema};
use crate::validation::validate_result;
use crate::value::ConfigValue;

/// Type name of the data source.
pub const TYPE_NAME: &str = "netbox_cluster_type";

const CLUSTER_TYPES_PATH: &str = "/api/virtualization/cluster-types/";

/// A cluster type as returned by the NetBox API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterType {
    /// NetBox object id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// URL-friendly identifier.
    pub slug: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    count: u64,
    results: Vec<T>,
}

/// Reads a cluster type by name.
#[derive(Debug, Default)]
pub struct ClusterTypeDataSource {
    client: Option<ClientHandle>,
}

impl ClusterTypeDataSource {
    /// Create an unconfigured data source.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Factory registered with the provider.
pub fn new_cluster_type_data_source() -> Box<dyn DataSource> {
    Box::new(ClusterTypeDataSource::new())
}

#[async_trait::async_trait]
impl DataSource for ClusterTypeDataSource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Look up a NetBox cluster type by name.")
            .with_attribute(
                "name",
                Attribute::required_string().with_description("Name of the cluster type."),
            )
            .with_attribute("id", Attribute::computed_int64())
            .with_attribute("slug", Attribute::computed_string())
    }

    fn configure(&mut self, client: ClientHandle) {
        self.client = Some(client);
    }

    #[instrument(skip(self, config), name = "netbox_cluster_type.read")]
    async fn read(&self, config: Value) -> Result<Value, ProviderError> {
        let client = self.client.as_ref().ok_or_else(|| {
            ProviderError::Configuration(
                "the NetBox client is not configured; configure the provider first".to_string(),
            )
        })?;

        validate_result(&self.schema(), &config).map_err(|diagnostics| {
            let summaries: Vec<_> = diagnostics.into_iter().map(|d| d.summary).collect();
            ProviderError::Validation(summaries.join("; "))
        })?;
        let name = match ConfigValue::<String>::decode(&config, "name") {
            Ok(ConfigValue::Known(name)) => name,
            Ok(ConfigValue::Unknown) => {
                return Err(ProviderError::Validation(
                    "the cluster type name is not known yet".to_string(),
                ))
            },
            Ok(ConfigValue::Null) => {
                return Err(ProviderError::Validation(
                    "Missing required attribute 'name'".to_string(),
                ))
            },
            Err(diagnostic) => return Err(ProviderError::Validation(diagnostic.summary)),
        };

        let list: ListResponse<ClusterType> = client
            .get_json(CLUSTER_TYPES_PATH, &[("name", name.as_str())])
            .await?;
        debug!(name = %name, count = list.count, "cluster type lookup completed");

        if list.count > 1 || list.results.len() > 1 {
            return Err(ProviderError::Validation(format!(
                "more than one cluster type matches name '{}'",
                name
            )));
        }
        let cluster_type = list.results.into_iter().next().ok_or_else(|| {
            ProviderError::NotFound(format!("no cluster type matches name '{}'", name))
        })?;

        Ok(serde_json::to_value(cluster_type)?)
    }
}

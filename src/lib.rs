//! NetBox Provider
//!
//! An infrastructure-as-code provider for [NetBox](https://netbox.dev). The
//! host configures the provider once per session; the provider then serves
//! resource and data source operations against the NetBox REST API.
//!
//! # Overview
//!
//! - **Configuration**: [`config::resolve`] merges explicit settings with the
//!   `NETBOX_*` environment fallbacks and normalizes the server URL
//! - **Client**: [`client::bootstrap`] builds the shared, authenticated API client
//! - **Handlers**: [`registry::Registry`] holds the resource and data source catalog
//! - **Provider**: [`NetboxProvider`] ties the above together behind [`ProviderService`]
//! - **Logging**: Integration with `tracing` for structured logging
//!
//! # Quick Start
//!
//! ```ignore
//! use netbox_provider::{init_logging, NetboxProvider, ProviderService};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!
//!     let provider = NetboxProvider::new(env!("CARGO_PKG_VERSION"));
//!     let diagnostics = provider
//!         .configure(json!({"server_url": "https://netbox.example.com/"}))
//!         .await?;
//!     for diagnostic in &diagnostics {
//!         tracing::warn!(summary = %diagnostic.summary, "configure");
//!     }
//!
//!     let cluster_type = provider
//!         .read_data_source("netbox_cluster_type", json!({"name": "VMware vSphere"}))
//!         .await?;
//!     println!("{}", cluster_type["slug"]);
//!     Ok(())
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `NETBOX_SERVER_URL`: server URL when `server_url` is not set
//! - `NETBOX_API_TOKEN`: API token when `api_token` is not set
//! - `NETBOX_STRIP_TRAILING_SLASHES_FROM_URL`: `false` disables URL normalization
//!   when `strip_trailing_slashes_from_url` is not set
//! - `RUST_LOG`: log filter, see [`logging`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod data_sources;
pub mod env;
pub mod error;
pub mod logging;
pub mod provider;
pub mod registry;
pub mod schema;
pub mod service;
pub mod testing;
pub mod types;
pub mod validation;
pub mod value;

// Re-export main types at crate root
pub use client::{bootstrap, ClientHandle, NetboxClient};
pub use config::{resolve, ConfigurationInput, Resolution, ResolvedConfiguration};
pub use env::{EnvLookup, ProcessEnv};
pub use error::{ConstructionError, ProviderError};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::NetboxProvider;
pub use registry::{DataSource, Registry, Resource};
pub use schema::{Diagnostic, ProviderSchema};
pub use service::ProviderService;
pub use types::{AttributeChange, PlanResult, ProviderMetadata};
pub use validation::{validate, validate_result};
pub use value::ConfigValue;

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;

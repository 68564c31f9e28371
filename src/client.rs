//! NetBox API client construction.
//!
//! [`bootstrap`] turns a [`ResolvedConfiguration`] into a [`ClientHandle`]
//! shared read-only by every resource and data source handler. Construction
//! is local setup only; no request is sent to NetBox.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ResolvedConfiguration;
use crate::error::{ConstructionError, ProviderError};

/// Timeout applied to every request against the NetBox API.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared, read-only handle to the NetBox API.
pub type ClientHandle = Arc<NetboxClient>;

/// Client for the NetBox REST API.
#[derive(Clone)]
pub struct NetboxClient {
    server_url: String,
    http: reqwest::Client,
}

impl fmt::Debug for NetboxClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetboxClient")
            .field("server_url", &self.server_url)
            .finish_non_exhaustive()
    }
}

impl NetboxClient {
    /// Build a client for `server_url` authenticating with `api_token`.
    pub fn new(server_url: &str, api_token: &SecretString) -> Result<Self, ConstructionError> {
        let parsed = Url::parse(server_url)
            .map_err(|e| ConstructionError::new(format!("invalid server URL: {}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConstructionError::new(format!(
                "unsupported URL scheme '{}', expected http or https",
                parsed.scheme()
            )));
        }
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(ConstructionError::new("server URL has no host"));
        }

        let mut auth = HeaderValue::from_str(&format!("Token {}", api_token.expose_secret()))
            .map_err(|_| ConstructionError::new("API token contains invalid header characters"))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ConstructionError::new(e.to_string()))?;

        Ok(Self {
            server_url: server_url.to_owned(),
            http,
        })
    }

    /// The server URL this client talks to, as resolved.
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Absolute URL for an API path such as `/api/dcim/sites/`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.server_url, path)
    }

    /// GET `path` with the given query parameters and decode the JSON body.
    #[instrument(skip(self, query), fields(server_url = %self.server_url))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let response = self
            .http
            .get(self.endpoint(path))
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), "NetBox API responded");

        if !status.is_success() {
            return Err(status_error(status, body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

fn status_error(status: StatusCode, body: String) -> ProviderError {
    let message = if body.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, body)
    };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::PermissionDenied(message)
        },
        StatusCode::NOT_FOUND => ProviderError::NotFound(message),
        s if s.is_server_error() => ProviderError::Unavailable(message),
        _ => ProviderError::InvalidRequest(message),
    }
}

/// Construct the shared NetBox client from a resolved configuration.
pub fn bootstrap(config: ResolvedConfiguration) -> Result<ClientHandle, ConstructionError> {
    NetboxClient::new(&config.server_url, &config.api_token).map(Arc::new)
}

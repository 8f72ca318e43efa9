//! Session-bound client with typed HTTP methods.
//!
//! This module provides `SessionClient`, which combines a Bulk API session
//! with an HTTP client and provides typed JSON methods for API interactions.
//!
//! ## Security
//!
//! - Session ids are redacted in Debug output
//! - Request bodies are skipped in tracing spans

use serde::{de::DeserializeOwned, Serialize};
use tracing::instrument;

use crate::client::SfHttpClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::request::RequestBuilder;
use crate::DEFAULT_API_VERSION;

/// Session-bound Bulk API client.
///
/// Every request built through this client carries the `X-SFDC-Session`
/// header and, for the async API, `Content-Type: application/json`. Every
/// typed method validates the response with
/// [`Response::check_status`](crate::Response::check_status).
///
/// # Example
///
/// ```rust,ignore
/// use sfbulk_client::SessionClient;
///
/// let client = SessionClient::new("https://na1.salesforce.com", session_id)?;
///
/// let job: serde_json::Value = client
///     .post_json(&client.async_url("job"), &descriptor)
///     .await?;
/// ```
#[derive(Clone)]
pub struct SessionClient {
    http: SfHttpClient,
    instance_url: String,
    session_id: String,
    api_version: String,
}

impl std::fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient")
            .field("instance_url", &self.instance_url)
            .field("session_id", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl SessionClient {
    /// Create a new client for the given instance URL and session id.
    pub fn new(instance_url: impl Into<String>, session_id: impl Into<String>) -> Result<Self> {
        Self::with_config(instance_url, session_id, ClientConfig::default())
    }

    /// Create a new client with custom configuration.
    pub fn with_config(
        instance_url: impl Into<String>,
        session_id: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let http = SfHttpClient::new(config)?;
        Ok(Self::from_http(http, instance_url, session_id))
    }

    /// Create a client sharing an existing HTTP client.
    pub fn from_http(
        http: SfHttpClient,
        instance_url: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            http,
            instance_url: instance_url.into().trim_end_matches('/').to_string(),
            session_id: session_id.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Set the API version (e.g., "36.0").
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Get the instance URL.
    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    /// Get the session id.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Get the API version.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Get the underlying HTTP client.
    pub fn http(&self) -> &SfHttpClient {
        &self.http
    }

    /// Base endpoint of the async (Bulk) API.
    ///
    /// Example: `https://na1.salesforce.com/services/async/36.0`
    pub fn async_endpoint(&self) -> String {
        format!(
            "{}/services/async/{}",
            self.instance_url, self.api_version
        )
    }

    /// Build an async API URL for a path.
    ///
    /// Example: `async_url("job")` -> `{instance}/services/async/36.0/job`
    pub fn async_url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}/{}", self.async_endpoint(), path)
    }

    // =========================================================================
    // Base HTTP Methods (with session header)
    // =========================================================================

    /// Create a GET request builder with the session header.
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.http
            .get(url)
            .session(&self.session_id)
            .header("Content-Type", "application/json")
    }

    /// Create a POST request builder with the session header.
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.http
            .post(url)
            .session(&self.session_id)
            .header("Content-Type", "application/json")
    }

    /// Execute a request and return the raw response without status checks.
    pub async fn execute(&self, request: RequestBuilder) -> Result<crate::Response> {
        self.http.execute(request).await
    }

    // =========================================================================
    // Typed JSON Methods
    // =========================================================================

    /// GET request with JSON response deserialization.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.http.send_json(self.get(url)).await
    }

    /// POST request with JSON body and response.
    #[instrument(skip(self, body), fields(url = %url))]
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.post(url).json(body)?;
        self.http.send_json(request).await
    }

    /// POST request with JSON body, returning the response text.
    ///
    /// Only the status is validated; the body may be empty.
    #[instrument(skip(self, body), fields(url = %url))]
    pub async fn post_json_text<B: Serialize>(&self, url: &str, body: &B) -> Result<String> {
        let request = self.post(url).json(body)?;
        self.http.send(request).await?.text().await
    }

    /// POST a raw text body (sent as `application/json`, which is how JSON
    /// jobs accept query batches) and deserialize the JSON response.
    #[instrument(skip(self, body), fields(url = %url))]
    pub async fn post_text_json<T: DeserializeOwned>(&self, url: &str, body: &str) -> Result<T> {
        let request = self
            .post(url)
            .text(body)
            .header("Content-Type", "application/json");
        self.http.send_json(request).await
    }
}

//! Bulk API client facade.
//!
//! Creates jobs and hands out [`Job`] handles bound to one session.

use sfbulk_auth::{Credentials, LoginResult, PRODUCTION_LOGIN_URL};
use sfbulk_client::{ClientConfig, SessionClient, SfHttpClient, DEFAULT_API_VERSION};
use tracing::{info, instrument};

use crate::error::{Error, ErrorKind, Result};
use crate::job::Job;
use crate::types::{CreateJobRequest, JobInfo, JobOptions, Operation};

/// Salesforce Bulk API client.
///
/// Every request goes to `{instance}/services/async/{version}` and carries
/// the session in the `X-SFDC-Session` header.
///
/// # Example
///
/// ```rust,ignore
/// use sfbulk_jobs::{BulkClient, JobOptions};
///
/// let client = BulkClient::builder()
///     .username("user@example.com")
///     .password("passwordTOKEN")
///     .build()
///     .await?;
///
/// let job = client.create_insert_job("Account", JobOptions::default()).await?;
/// job.post_rows(&rows).await?;
/// job.close().await?;
/// job.wait_default().await?;
/// ```
#[derive(Debug, Clone)]
pub struct BulkClient {
    client: SessionClient,
}

impl BulkClient {
    /// Start building a client.
    pub fn builder() -> BulkClientBuilder {
        BulkClientBuilder::default()
    }

    /// Create a client from an existing session.
    pub fn new(instance_url: impl Into<String>, session_id: impl Into<String>) -> Result<Self> {
        let client = SessionClient::new(instance_url, session_id)?;
        Ok(Self { client })
    }

    /// Create a client from an existing session with custom HTTP configuration.
    pub fn with_config(
        instance_url: impl Into<String>,
        session_id: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let client = SessionClient::with_config(instance_url, session_id, config)?;
        Ok(Self { client })
    }

    /// Create a client from any credentials source.
    pub fn from_credentials(credentials: &impl Credentials) -> Result<Self> {
        if !credentials.is_valid() {
            return Err(Error::new(ErrorKind::Config(
                "credentials need both an instance URL and a session id".to_string(),
            )));
        }
        Ok(Self::new(credentials.instance_url(), credentials.session_id())?
            .with_api_version(credentials.api_version()))
    }

    /// Create a client around an existing SessionClient.
    pub fn from_client(client: SessionClient) -> Self {
        Self { client }
    }

    /// One-shot SOAP login. See [`sfbulk_auth::login`].
    pub async fn login(
        username: &str,
        password: &str,
        login_host: &str,
        api_version: &str,
    ) -> Result<LoginResult> {
        Ok(sfbulk_auth::login(username, password, login_host, api_version).await?)
    }

    /// Get the underlying SessionClient.
    pub fn inner(&self) -> &SessionClient {
        &self.client
    }

    pub fn instance_url(&self) -> &str {
        self.client.instance_url()
    }

    pub fn api_version(&self) -> &str {
        self.client.api_version()
    }

    /// Set the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.client = self.client.with_api_version(version);
        self
    }

    /// `{instance}/services/async/{version}`
    pub fn endpoint(&self) -> String {
        self.client.async_endpoint()
    }

    /// Reattach to an existing job. The handle starts with no batches.
    pub fn job(&self, job_id: impl Into<String>) -> Job {
        Job::new(self.client.clone(), job_id)
    }

    // =========================================================================
    // Job creation
    // =========================================================================

    /// Create a job with JSON content.
    #[instrument(skip(self, options))]
    pub async fn create_job(
        &self,
        object: &str,
        operation: Operation,
        options: JobOptions,
    ) -> Result<Job> {
        let request = CreateJobRequest::new(object, operation, options);
        let info: JobInfo = self
            .client
            .post_json(&self.client.async_url("job"), &request)
            .await?;
        if info.id.is_empty() {
            return Err(Error::new(ErrorKind::Json(
                "job creation response has no id".to_string(),
            )));
        }
        info!(job_id = %info.id, "Job created");
        Ok(self.job(info.id))
    }

    pub async fn create_query_job(&self, object: &str, options: JobOptions) -> Result<Job> {
        self.create_job(object, Operation::Query, options).await
    }

    pub async fn create_insert_job(&self, object: &str, options: JobOptions) -> Result<Job> {
        self.create_job(object, Operation::Insert, options).await
    }

    /// Create an upsert job matching rows on `external_id_field`.
    pub async fn create_upsert_job(
        &self,
        object: &str,
        external_id_field: &str,
        options: JobOptions,
    ) -> Result<Job> {
        let options = options.with_external_id_field(external_id_field);
        self.create_job(object, Operation::Upsert, options).await
    }

    pub async fn create_update_job(&self, object: &str, options: JobOptions) -> Result<Job> {
        self.create_job(object, Operation::Update, options).await
    }

    pub async fn create_delete_job(&self, object: &str, options: JobOptions) -> Result<Job> {
        self.create_job(object, Operation::Delete, options).await
    }
}

/// Builder for [`BulkClient`].
///
/// Needs either a session (`session_id` + `instance_url`) or a login
/// (`username` + `password`). A supplied session is used as is.
#[derive(Default)]
pub struct BulkClientBuilder {
    session_id: Option<String>,
    instance_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    login_url: Option<String>,
    api_version: Option<String>,
    config: Option<ClientConfig>,
}

impl std::fmt::Debug for BulkClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkClientBuilder")
            .field("session_id", &self.session_id.as_ref().map(|_| "[REDACTED]"))
            .field("instance_url", &self.instance_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("login_url", &self.login_url)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl BulkClientBuilder {
    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn instance_url(mut self, instance_url: impl Into<String>) -> Self {
        self.instance_url = Some(instance_url.into());
        self
    }

    /// Take instance URL, session id and API version from a credentials source.
    pub fn credentials(self, credentials: &impl Credentials) -> Self {
        self.instance_url(credentials.instance_url())
            .session_id(credentials.session_id())
            .api_version(credentials.api_version())
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Password with the security token appended, if the org requires one.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Login host; defaults to `https://login.salesforce.com`.
    pub fn login_url(mut self, login_url: impl Into<String>) -> Self {
        self.login_url = Some(login_url.into());
        self
    }

    /// API version; defaults to `36.0`.
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the client, logging in first unless a session was supplied.
    ///
    /// Missing or half-supplied credentials fail before any request.
    #[instrument(skip(self))]
    pub async fn build(self) -> Result<BulkClient> {
        let api_version = self
            .api_version
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        match (self.session_id, self.username, self.password) {
            (Some(session_id), _, _) => {
                let instance_url = self.instance_url.ok_or_else(|| {
                    config_error("a session id needs an instance URL")
                })?;
                let http = SfHttpClient::new(self.config.unwrap_or_default())?;
                let client = SessionClient::from_http(http, instance_url, session_id)
                    .with_api_version(api_version);
                Ok(BulkClient { client })
            }
            (None, Some(username), Some(password)) => {
                let http = SfHttpClient::new(self.config.unwrap_or_default())?;
                let login_url = self
                    .login_url
                    .unwrap_or_else(|| PRODUCTION_LOGIN_URL.to_string());
                let session = sfbulk_auth::login_with_client(
                    &http,
                    &username,
                    &password,
                    &login_url,
                    &api_version,
                )
                .await?;
                info!(instance_url = %session.instance_url, "Logged in");

                let client = SessionClient::from_http(
                    http,
                    session.instance_url.clone(),
                    session.session_id(),
                )
                .with_api_version(api_version);
                Ok(BulkClient { client })
            }
            (None, Some(_), None) => Err(config_error("a username needs a password")),
            (None, None, Some(_)) => Err(config_error("a password needs a username")),
            (None, None, None) => Err(config_error(
                "either a session id and instance URL or a username and password is required",
            )),
        }
    }
}

fn config_error(message: &str) -> Error {
    Error::new(ErrorKind::Config(message.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn login_body(server_url: &str) -> String {
        format!(
            r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns="urn:partner.soap.sforce.com">
<soapenv:Body><loginResponse><result>
<serverUrl>{server_url}/services/Soap/u/36.0/00D</serverUrl>
<sessionId>SESSION123</sessionId>
</result></loginResponse></soapenv:Body></soapenv:Envelope>"#
        )
    }

    #[test]
    fn test_client_creation() {
        let client = BulkClient::new("https://na1.salesforce.com/", "sid").unwrap();

        assert_eq!(client.instance_url(), "https://na1.salesforce.com");
        assert_eq!(client.api_version(), "36.0");
        assert_eq!(
            client.endpoint(),
            "https://na1.salesforce.com/services/async/36.0"
        );
    }

    #[test]
    fn test_from_credentials() {
        let creds =
            sfbulk_auth::SessionCredentials::new("https://na1.salesforce.com", "sid", "47.0");
        let client = BulkClient::from_credentials(&creds).unwrap();
        assert_eq!(client.api_version(), "47.0");

        let empty = sfbulk_auth::SessionCredentials::new("", "sid", "47.0");
        let err = BulkClient::from_credentials(&empty).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Config(_)));
    }

    #[test]
    fn test_job_handle() {
        let client = BulkClient::new("https://na1.salesforce.com", "sid").unwrap();
        let job = client.job("750x");
        assert_eq!(
            job.endpoint(),
            "https://na1.salesforce.com/services/async/36.0/job/750x"
        );
    }

    #[test]
    fn test_builder_debug_redacts() {
        let builder = BulkClient::builder().session_id("secret_sid").password("hunter2");
        let debug_output = format!("{:?}", builder);
        assert!(!debug_output.contains("secret_sid"));
        assert!(!debug_output.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_builder_requires_credentials() {
        let err = BulkClient::builder().build().await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Config(_)));

        let err = BulkClient::builder()
            .username("user@example.com")
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Config(_)));

        let err = BulkClient::builder()
            .session_id("sid")
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Config(_)));
    }

    #[tokio::test]
    async fn test_builder_honours_session() {
        let server = MockServer::start().await;

        let client = BulkClient::builder()
            .session_id("sid")
            .instance_url(server.uri())
            .username("user@example.com")
            .password("pw")
            .api_version("40.0")
            .build()
            .await
            .unwrap();

        assert_eq!(client.api_version(), "40.0");
        assert_eq!(client.inner().session_id(), "sid");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_builder_logs_in() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/Soap/u/36.0"))
            .and(header("SOAPAction", "login"))
            .respond_with(ResponseTemplate::new(200).set_body_string(login_body(&server.uri())))
            .expect(1)
            .mount(&server)
            .await;

        let client = BulkClient::builder()
            .username("user@example.com")
            .password("pwTOKEN")
            .login_url(server.uri())
            .build()
            .await
            .unwrap();

        assert_eq!(client.instance_url(), server.uri());
        assert_eq!(client.inner().session_id(), "SESSION123");
    }

    #[tokio::test]
    async fn test_builder_login_missing_session_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/Soap/u/36.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<r xmlns="urn:partner.soap.sforce.com"><serverUrl>https://na1.salesforce.com</serverUrl></r>"#,
            ))
            .mount(&server)
            .await;

        let err = BulkClient::builder()
            .username("user@example.com")
            .password("pw")
            .login_url(server.uri())
            .build()
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::Auth(_)));
    }

    #[tokio::test]
    async fn test_create_job_descriptor() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/async/36.0/job"))
            .and(header("X-SFDC-Session", "sid"))
            .and(body_json(json!({
                "operation": "upsert",
                "object": "Contact",
                "contentType": "JSON",
                "externalIdFieldName": "Ext__c",
                "concurrencyMode": "Parallel"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "750new",
                "operation": "upsert",
                "object": "Contact",
                "state": "Open"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = BulkClient::new(server.uri(), "sid").unwrap();
        let job = client
            .create_upsert_job(
                "Contact",
                "Ext__c",
                JobOptions::new().with_concurrency_mode(crate::ConcurrencyMode::Parallel),
            )
            .await
            .unwrap();

        assert_eq!(job.id(), "750new");
        assert!(job.batches().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_job_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/async/36.0/job"))
            .respond_with(ResponseTemplate::new(400).set_body_string("InvalidSessionId"))
            .mount(&server)
            .await;

        let client = BulkClient::new(server.uri(), "stale").unwrap();
        let err = client
            .create_insert_job("Account", JobOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), Some(400));
        assert!(err.to_string().contains("InvalidSessionId"));
    }

    #[tokio::test]
    async fn test_create_job_without_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/async/36.0/job"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"state": "Open"})))
            .mount(&server)
            .await;

        let client = BulkClient::new(server.uri(), "sid").unwrap();
        let err = client
            .create_query_job("Account", JobOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::Json(_)));
    }
}

//! Credentials trait and implementations.
//!
//! All credential types implement custom Debug to redact sensitive data.

use crate::error::{Error, ErrorKind, Result};

/// Trait for Bulk API session credentials.
pub trait Credentials: Send + Sync {
    /// Get the Salesforce instance URL.
    fn instance_url(&self) -> &str;

    /// Get the session id.
    fn session_id(&self) -> &str;

    /// Get the API version (e.g., "36.0").
    fn api_version(&self) -> &str;

    /// Returns true if the credentials appear to be valid (non-empty).
    fn is_valid(&self) -> bool {
        !self.instance_url().is_empty() && !self.session_id().is_empty()
    }
}

/// An established session: instance URL plus session id.
///
/// The session id is redacted in Debug output.
#[derive(Clone)]
pub struct SessionCredentials {
    instance_url: String,
    session_id: String,
    api_version: String,
}

impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("instance_url", &self.instance_url)
            .field("session_id", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl SessionCredentials {
    /// Create new credentials with the given values.
    pub fn new(
        instance_url: impl Into<String>,
        session_id: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            instance_url: instance_url.into(),
            session_id: session_id.into(),
            api_version: api_version.into(),
        }
    }

    /// Load credentials from environment variables.
    ///
    /// Required environment variables:
    /// - `SF_INSTANCE_URL` or `SALESFORCE_INSTANCE_URL`
    /// - `SF_SESSION_ID` or `SALESFORCE_SESSION_ID`
    ///
    /// Optional:
    /// - `SF_API_VERSION` or `SALESFORCE_API_VERSION` (default: "36.0")
    pub fn from_env() -> Result<Self> {
        let instance_url = env_var("SF_INSTANCE_URL", "SALESFORCE_INSTANCE_URL")?;
        let session_id = env_var("SF_SESSION_ID", "SALESFORCE_SESSION_ID")?;
        let api_version = api_version_from_env();

        Ok(Self::new(instance_url, session_id, api_version))
    }
}

impl Credentials for SessionCredentials {
    fn instance_url(&self) -> &str {
        &self.instance_url
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn api_version(&self) -> &str {
        &self.api_version
    }
}

/// Username/password pair for the SOAP login exchange.
///
/// The password is the account password with the security token appended.
/// It is redacted in Debug output.
#[derive(Clone)]
pub struct PasswordCredentials {
    username: String,
    password: String,
    login_url: String,
    api_version: String,
}

impl std::fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("login_url", &self.login_url)
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl PasswordCredentials {
    /// Create password credentials against the production login host.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            login_url: crate::PRODUCTION_LOGIN_URL.to_string(),
            api_version: sfbulk_client::DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Set the login host (e.g. [`SANDBOX_LOGIN_URL`](crate::SANDBOX_LOGIN_URL)).
    pub fn with_login_url(mut self, login_url: impl Into<String>) -> Self {
        self.login_url = login_url.into();
        self
    }

    /// Set the API version used for the login endpoint.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Load password credentials from environment variables.
    ///
    /// Required: `SF_USERNAME`, `SF_PASSWORD`.
    /// Optional: `SF_LOGIN_URL` (default: production), `SF_API_VERSION`.
    pub fn from_env() -> Result<Self> {
        let username = env_var("SF_USERNAME", "SALESFORCE_USERNAME")?;
        let password = env_var("SF_PASSWORD", "SALESFORCE_PASSWORD")?;

        let mut creds = Self::new(username, password).with_api_version(api_version_from_env());
        if let Ok(login_url) = std::env::var("SF_LOGIN_URL") {
            creds = creds.with_login_url(login_url);
        }
        Ok(creds)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Password with the security token appended.
    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Exchange these credentials for a session.
    pub async fn login(&self) -> Result<SessionCredentials> {
        let result = crate::login::login(
            &self.username,
            &self.password,
            &self.login_url,
            &self.api_version,
        )
        .await?;
        Ok(result.to_credentials(&self.api_version))
    }
}

fn env_var(primary: &str, fallback: &str) -> Result<String> {
    std::env::var(primary)
        .or_else(|_| std::env::var(fallback))
        .map_err(|_| Error::new(ErrorKind::EnvVar(primary.to_string())))
}

fn api_version_from_env() -> String {
    std::env::var("SF_API_VERSION")
        .or_else(|_| std::env::var("SALESFORCE_API_VERSION"))
        .unwrap_or_else(|_| sfbulk_client::DEFAULT_API_VERSION.to_string())
}

//! Error types for sfbulk-auth.
//!
//! Error messages are designed to avoid exposing sensitive credential data.

/// Result type alias for sfbulk-auth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sfbulk-auth operations.
///
/// Error messages are sanitized to prevent accidental credential exposure.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }
}

/// The kind of error that occurred.
///
/// Error messages avoid including credential values.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// The login server answered with a SOAP fault.
    #[error("Login fault: {code} - {message}")]
    LoginFault { code: String, message: String },

    /// An expected element was absent from the login response.
    #[error("Missing element in login response: {0}")]
    MissingElement(String),

    /// The login response was not well-formed XML.
    #[error("XML error: {0}")]
    Xml(String),

    /// HTTP error during authentication.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Environment variable not set.
    #[error("Environment variable not set: {0}")]
    EnvVar(String),

    /// Invalid credentials configuration.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::with_source(ErrorKind::Xml(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::InvalidCredentials(format!("invalid URL: {}", err)), err)
    }
}

impl From<sfbulk_client::Error> for Error {
    fn from(err: sfbulk_client::Error) -> Self {
        // The login body echoes the username; keep only the status.
        let message = match err.status_code() {
            Some(status) => format!("login request failed with status {}", status),
            None => err.to_string(),
        };
        Error::with_source(ErrorKind::Http(message), err)
    }
}

//! Error types for sfbulk-jobs.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    pub kind: ErrorKind,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// HTTP status code, if the error came from a rejected request.
    pub fn status_code(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_batch_failed(&self) -> bool {
        matches!(self.kind, ErrorKind::BatchFailed { .. })
    }

    pub fn is_job_aborted(&self) -> bool {
        matches!(self.kind, ErrorKind::JobAborted { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Rejected before any request was sent.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bulk API HTTP Error result: {message}")]
    Http { status: u16, message: String },

    #[error("Job {job_id} was aborted")]
    JobAborted { job_id: String },

    #[error("Batch {batch_id} of job {job_id} failed: {state_message}")]
    BatchFailed {
        job_id: String,
        batch_id: String,
        state_message: String,
    },

    #[error("Auth error: {0}")]
    Auth(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl From<sfbulk_client::Error> for Error {
    fn from(err: sfbulk_client::Error) -> Self {
        let kind = match &err.kind {
            sfbulk_client::ErrorKind::Http { status, message } => ErrorKind::Http {
                status: *status,
                message: message.clone(),
            },
            sfbulk_client::ErrorKind::Json(msg) => ErrorKind::Json(msg.clone()),
            sfbulk_client::ErrorKind::Config(msg) => ErrorKind::Config(msg.clone()),
            _ => ErrorKind::Client(err.to_string()),
        };
        Error::with_source(kind, err)
    }
}

impl From<sfbulk_auth::Error> for Error {
    fn from(err: sfbulk_auth::Error) -> Self {
        Error::with_source(ErrorKind::Auth(err.to_string()), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

//! Types for the Bulk API (async, JSON content).

use serde::{Deserialize, Deserializer, Serialize};

/// A single record: field name to value.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Deserialize API version that can be either a float (36.0) or string ("36.0").
pub(crate) fn deserialize_api_version<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ApiVersion {
        Float(f64),
        String(String),
    }

    Option::<ApiVersion>::deserialize(deserializer).map(|opt| {
        opt.map(|v| match v {
            ApiVersion::Float(f) => format!("{:.1}", f),
            ApiVersion::String(s) => s,
        })
    })
}

/// Bulk API operation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Query records
    Query,
    /// Insert new records
    Insert,
    /// Upsert based on external ID
    Upsert,
    /// Update existing records
    Update,
    /// Delete records (soft delete)
    Delete,
}

/// How the server processes a job's batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcurrencyMode {
    Parallel,
    Serial,
}

/// Optional job attributes.
#[derive(Debug, Clone, Default)]
pub struct JobOptions {
    pub concurrency_mode: Option<ConcurrencyMode>,
    /// Required by the server for upsert jobs.
    pub external_id_field: Option<String>,
}

impl JobOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concurrency_mode(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = Some(mode);
        self
    }

    pub fn with_external_id_field(mut self, field: impl Into<String>) -> Self {
        self.external_id_field = Some(field.into());
        self
    }
}

// =============================================================================
// Request Types
// =============================================================================

/// Job descriptor posted to `{base}/job`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub operation: Operation,
    pub object: String,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id_field_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency_mode: Option<ConcurrencyMode>,
}

impl CreateJobRequest {
    /// Create a JSON-content job descriptor.
    pub fn new(object: impl Into<String>, operation: Operation, options: JobOptions) -> Self {
        Self {
            operation,
            object: object.into(),
            content_type: "JSON".to_string(),
            external_id_field_name: options.external_id_field,
            concurrency_mode: options.concurrency_mode,
        }
    }
}

/// Body of a job state change.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct UpdateJobStateRequest {
    pub state: JobState,
}

impl UpdateJobStateRequest {
    pub fn close() -> Self {
        Self {
            state: JobState::Closed,
        }
    }

    pub fn abort() -> Self {
        Self {
            state: JobState::Aborted,
        }
    }
}

// =============================================================================
// Job
// =============================================================================

/// Job states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobState {
    /// Job accepts new batches
    Open,
    /// No more batches will be added
    Closed,
    /// Job was aborted; unprocessed batches will not run
    Aborted,
    /// Job failed
    Failed,
    /// Any state name this client does not model
    Other(String),
}

impl From<String> for JobState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Open" => JobState::Open,
            "Closed" => JobState::Closed,
            "Aborted" => JobState::Aborted,
            "Failed" => JobState::Failed,
            _ => JobState::Other(s),
        }
    }
}

impl From<JobState> for String {
    fn from(state: JobState) -> Self {
        match state {
            JobState::Open => "Open".to_string(),
            JobState::Closed => "Closed".to_string(),
            JobState::Aborted => "Aborted".to_string(),
            JobState::Failed => "Failed".to_string(),
            JobState::Other(s) => s,
        }
    }
}

/// Job descriptor returned by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    /// Job ID
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub operation: Option<String>,
    /// SObject API name
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub state: Option<JobState>,
    #[serde(default)]
    pub concurrency_mode: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub external_id_field_name: Option<String>,
    #[serde(default)]
    pub number_batches_queued: i64,
    #[serde(default)]
    pub number_batches_in_progress: i64,
    #[serde(default)]
    pub number_batches_completed: i64,
    #[serde(default)]
    pub number_batches_failed: i64,
    #[serde(default)]
    pub number_batches_total: i64,
    #[serde(default)]
    pub number_records_processed: i64,
    #[serde(default)]
    pub number_records_failed: i64,
    /// API version (can be float like 36.0 or string like "36.0")
    #[serde(default, deserialize_with = "deserialize_api_version")]
    pub api_version: Option<String>,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub system_modstamp: Option<String>,
}

// =============================================================================
// Batch
// =============================================================================

/// Which result protocol a batch follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    /// Results are the per-row outcomes, fetched in one request.
    Ingest,
    /// Results are a list of chunk ids, each fetched separately.
    Query,
}

/// Batch states.
///
/// `Failed` and `Aborted` are errors. `Completed` is done. Everything else,
/// `NotProcessed` included, counts as still in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BatchState {
    Queued,
    InProgress,
    Completed,
    Failed,
    Aborted,
    NotProcessed,
    Other(String),
}

impl BatchState {
    pub fn is_error(&self) -> bool {
        matches!(self, BatchState::Failed | BatchState::Aborted)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, BatchState::Completed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            BatchState::Queued => "Queued",
            BatchState::InProgress => "InProgress",
            BatchState::Completed => "Completed",
            BatchState::Failed => "Failed",
            BatchState::Aborted => "Aborted",
            BatchState::NotProcessed => "Not Processed",
            BatchState::Other(s) => s,
        }
    }
}

impl From<String> for BatchState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Queued" => BatchState::Queued,
            "InProgress" => BatchState::InProgress,
            "Completed" => BatchState::Completed,
            "Failed" => BatchState::Failed,
            "Aborted" => BatchState::Aborted,
            "Not Processed" | "NotProcessed" => BatchState::NotProcessed,
            _ => BatchState::Other(s),
        }
    }
}

impl From<BatchState> for String {
    fn from(state: BatchState) -> Self {
        state.as_str().to_string()
    }
}

impl std::fmt::Display for BatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status snapshot of a batch.
///
/// Fields not modelled here are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStatus {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub state: Option<BatchState>,
    #[serde(default)]
    pub state_message: Option<String>,
    #[serde(default)]
    pub number_records_processed: i64,
    #[serde(default)]
    pub number_records_failed: i64,
    #[serde(default)]
    pub total_processing_time: i64,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub system_modstamp: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BatchStatus {
    pub fn is_error(&self) -> bool {
        self.state.as_ref().is_some_and(BatchState::is_error)
    }

    pub fn is_completed(&self) -> bool {
        self.state.as_ref().is_some_and(BatchState::is_completed)
    }

    /// Look up any status field by its wire name.
    pub fn field(&self, name: &str) -> Option<serde_json::Value> {
        match name {
            "id" => self.id.clone().map(Into::into),
            "jobId" => self.job_id.clone().map(Into::into),
            "state" => self.state.clone().map(|s| String::from(s).into()),
            "stateMessage" => self.state_message.clone().map(Into::into),
            "numberRecordsProcessed" => Some(self.number_records_processed.into()),
            "numberRecordsFailed" => Some(self.number_records_failed.into()),
            "totalProcessingTime" => Some(self.total_processing_time.into()),
            "createdDate" => self.created_date.clone().map(Into::into),
            "systemModstamp" => self.system_modstamp.clone().map(Into::into),
            _ => self.extra.get(name).cloned(),
        }
    }
}

//! Jobs: batch creation, aggregate waiting, and scoped use.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use futures::FutureExt;
use serde::Serialize;
use sfbulk_client::SessionClient;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::batch::{stop_after_error, Batch, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT};
use crate::error::{Error, ErrorKind, Result};
use crate::types::{BatchKind, BatchStatus, JobInfo, JobState, Record, UpdateJobStateRequest};

/// Rows per batch used by [`Job::post_rows`].
pub const DEFAULT_BATCH_SIZE: usize = 2500;

/// Handle to a Bulk API job.
///
/// Cloning is cheap; clones share the batch list. Batches are kept in
/// creation order, which is also the order results are returned in.
#[derive(Clone)]
pub struct Job {
    inner: Arc<JobInner>,
}

struct JobInner {
    client: SessionClient,
    id: String,
    endpoint: String,
    batches: Mutex<Vec<Batch>>,
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.inner.id)
            .field("endpoint", &self.inner.endpoint)
            .finish_non_exhaustive()
    }
}

impl Job {
    pub(crate) fn new(client: SessionClient, id: impl Into<String>) -> Self {
        let id = id.into();
        let endpoint = client.async_url(&format!("job/{}", id));
        Self {
            inner: Arc::new(JobInner {
                client,
                id,
                endpoint,
                batches: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// `{base}/job/{job}`
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Snapshot of the batches created through this handle, in order.
    pub async fn batches(&self) -> Vec<Batch> {
        self.inner.batches.lock().await.clone()
    }

    fn batch_url(&self) -> String {
        format!("{}/batch", self.inner.endpoint)
    }

    fn created_batch(&self, status: BatchStatus, kind: BatchKind) -> Result<Batch> {
        let id = status.id.ok_or_else(|| {
            Error::new(ErrorKind::Json(
                "batch creation response has no id".to_string(),
            ))
        })?;
        Ok(Batch::new(
            self.inner.client.clone(),
            &self.inner.id,
            &self.inner.endpoint,
            id,
            kind,
        ))
    }

    // =========================================================================
    // Batch creation
    // =========================================================================

    /// Submit a SOQL query as a batch.
    #[instrument(skip(self), fields(job_id = %self.inner.id))]
    pub async fn query(&self, soql: &str) -> Result<Batch> {
        let status: BatchStatus = self
            .inner
            .client
            .post_text_json(&self.batch_url(), soql)
            .await?;
        let batch = self.created_batch(status, BatchKind::Query)?;
        debug!(batch_id = %batch.id(), "Query batch created");

        self.inner.batches.lock().await.push(batch.clone());
        Ok(batch)
    }

    /// Upload `rows` as consecutive batches of at most `batch_size` rows.
    ///
    /// Returns only the batches created by this call. A failed upload stops
    /// the remaining chunks; batches created before it stay on the job.
    #[instrument(skip(self, rows), fields(job_id = %self.inner.id, rows = rows.len()))]
    pub async fn post<T: Serialize + Sync>(
        &self,
        rows: &[T],
        batch_size: usize,
    ) -> Result<Vec<Batch>> {
        if batch_size == 0 {
            return Err(Error::new(ErrorKind::Config(
                "batch size must be greater than zero".to_string(),
            )));
        }

        let url = self.batch_url();
        let mut created = Vec::with_capacity(rows.len().div_ceil(batch_size));
        for chunk in rows.chunks(batch_size) {
            let status: BatchStatus = self.inner.client.post_json(&url, &chunk).await?;
            let batch = self.created_batch(status, BatchKind::Ingest)?;
            debug!(batch_id = %batch.id(), rows = chunk.len(), "Batch created");

            self.inner.batches.lock().await.push(batch.clone());
            created.push(batch);
        }

        info!(batches = created.len(), "Rows uploaded");
        Ok(created)
    }

    /// [`post`](Self::post) with [`DEFAULT_BATCH_SIZE`].
    pub async fn post_rows<T: Serialize + Sync>(&self, rows: &[T]) -> Result<Vec<Batch>> {
        self.post(rows, DEFAULT_BATCH_SIZE).await
    }

    // =========================================================================
    // Completion
    // =========================================================================

    /// Whether every batch is done, using cached statuses.
    ///
    /// Stops at the first batch that is not done.
    pub async fn is_done(&self) -> Result<bool> {
        for batch in self.batches().await {
            if !batch.is_done(false).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Wait on each batch in turn, each with its own `timeout`.
    #[instrument(skip(self), fields(job_id = %self.inner.id))]
    pub async fn wait(&self, timeout: Duration, poll_interval: Duration) -> Result<()> {
        for batch in self.batches().await {
            batch.wait(timeout, poll_interval).await?;
        }
        Ok(())
    }

    pub async fn wait_default(&self) -> Result<()> {
        self.wait(DEFAULT_WAIT_TIMEOUT, DEFAULT_POLL_INTERVAL).await
    }

    /// Stream the records of every batch, batch by batch.
    ///
    /// Nothing is requested until the stream is first polled; the job is
    /// waited on first if it is not already done. The stream ends after the
    /// first error, so later batches are not fetched.
    pub fn results(&self) -> BoxStream<'static, Result<Record>> {
        let job = self.clone();
        stream::once(async move {
            if !job.is_done().await? {
                job.wait_default().await?;
            }
            let batches = job.batches().await;
            let records = stream::iter(batches).flat_map(|batch| batch.results());
            Ok::<_, Error>(stop_after_error(records))
        })
        .try_flatten()
        .boxed()
    }

    // =========================================================================
    // Job state
    // =========================================================================

    /// Close the job: no further batches will be added.
    #[instrument(skip(self), fields(job_id = %self.inner.id))]
    pub async fn close(&self) -> Result<JobInfo> {
        self.set_state(UpdateJobStateRequest::close()).await
    }

    /// Abort the job: unprocessed batches will not run.
    #[instrument(skip(self), fields(job_id = %self.inner.id))]
    pub async fn abort(&self) -> Result<JobInfo> {
        self.set_state(UpdateJobStateRequest::abort()).await
    }

    /// Only the HTTP status decides success. A body that is empty or not a
    /// job descriptor yields a descriptor holding the job id and the
    /// requested state.
    async fn set_state(&self, request: UpdateJobStateRequest) -> Result<JobInfo> {
        let body = self
            .inner
            .client
            .post_json_text(&self.inner.endpoint, &request)
            .await?;

        let mut info = match serde_json::from_str::<JobInfo>(&body) {
            Ok(info) => info,
            Err(err) => {
                if !body.trim().is_empty() {
                    debug!(error = %err, "Unrecognized job state response");
                }
                JobInfo::default()
            }
        };
        if info.id.is_empty() {
            info.id = self.inner.id.clone();
        }
        if info.state.is_none() {
            info.state = Some(request.state);
        }

        info!(state = ?info.state, "Job state changed");
        Ok(info)
    }

    /// Fetch the job descriptor. An aborted job is reported as `JobAborted`.
    #[instrument(skip(self), fields(job_id = %self.inner.id))]
    pub async fn info(&self) -> Result<JobInfo> {
        let info: JobInfo = self.inner.client.get_json(&self.inner.endpoint).await?;
        if info.state == Some(JobState::Aborted) {
            return Err(Error::new(ErrorKind::JobAborted {
                job_id: info.id,
            }));
        }
        Ok(info)
    }

    /// Run `f` with this job, then close the job however `f` ends.
    ///
    /// An error from `f` is returned as is; if closing also fails that
    /// failure is only logged. A panic in `f` resumes after the close. If
    /// `f` succeeds, a close failure is returned. If the returned future is
    /// dropped before it finishes, the close is spawned on the current tokio
    /// runtime instead.
    pub async fn scoped<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(Job) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut guard = CloseOnDrop::new(self.clone());
        let job = self.clone();
        let outcome = AssertUnwindSafe(async move { f(job).await })
            .catch_unwind()
            .await;
        let closed = self.close().await;
        guard.disarm();

        match outcome {
            Ok(Ok(value)) => closed.map(|_| value),
            Ok(Err(err)) => {
                if let Err(close_err) = closed {
                    warn!(
                        job_id = %self.inner.id,
                        error = %close_err,
                        "Failed to close job after error"
                    );
                }
                Err(err)
            }
            Err(panic) => {
                if let Err(close_err) = closed {
                    warn!(
                        job_id = %self.inner.id,
                        error = %close_err,
                        "Failed to close job after panic"
                    );
                }
                std::panic::resume_unwind(panic)
            }
        }
    }
}

/// Closes the job in the background unless disarmed before drop.
struct CloseOnDrop {
    job: Option<Job>,
}

impl CloseOnDrop {
    fn new(job: Job) -> Self {
        Self { job: Some(job) }
    }

    fn disarm(&mut self) {
        self.job = None;
    }
}

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        let Some(job) = self.job.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!(job_id = %job.id(), "Scope cancelled, closing job in background");
                handle.spawn(async move {
                    if let Err(err) = job.close().await {
                        warn!(job_id = %job.id(), error = %err, "Failed to close cancelled job");
                    }
                });
            }
            Err(_) => warn!(job_id = %job.id(), "No runtime left to close cancelled job"),
        }
    }
}

//! Batches: status polling and result streaming.

use std::sync::Arc;
use std::time::Duration;

use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};
use sfbulk_client::SessionClient;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, instrument};

use crate::error::{Error, ErrorKind, Result};
use crate::types::{BatchKind, BatchStatus, Record};

/// Default upper bound on how long `wait_default` polls.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(600);

/// Default delay between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// End `stream` right after the first error it yields.
pub(crate) fn stop_after_error<S, T>(stream: S) -> impl Stream<Item = Result<T>>
where
    S: Stream<Item = Result<T>>,
{
    stream.scan(false, |failed, item| {
        if *failed {
            return future::ready(None);
        }
        *failed = item.is_err();
        future::ready(Some(item))
    })
}

#[derive(Debug, Clone, Default)]
enum StatusCache {
    #[default]
    Unknown,
    Snapshot(BatchStatus),
}

/// A batch within a job.
///
/// Cloning is cheap and clones share one status cache.
#[derive(Clone)]
pub struct Batch {
    client: SessionClient,
    job_id: String,
    id: String,
    endpoint: String,
    kind: BatchKind,
    status: Arc<Mutex<StatusCache>>,
}

impl std::fmt::Debug for Batch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batch")
            .field("job_id", &self.job_id)
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl Batch {
    pub(crate) fn new(
        client: SessionClient,
        job_id: impl Into<String>,
        job_endpoint: &str,
        id: impl Into<String>,
        kind: BatchKind,
    ) -> Self {
        let id = id.into();
        Self {
            endpoint: format!("{}/batch/{}", job_endpoint, id),
            client,
            job_id: job_id.into(),
            id,
            kind,
            status: Arc::new(Mutex::new(StatusCache::Unknown)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn kind(&self) -> BatchKind {
        self.kind
    }

    /// `{base}/job/{job}/batch/{batch}`
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Current status.
    ///
    /// Served from the cache unless `reload` is set or nothing has been
    /// fetched yet.
    #[instrument(skip(self), fields(batch_id = %self.id))]
    pub async fn status(&self, reload: bool) -> Result<BatchStatus> {
        let mut cache = self.status.lock().await;
        if let (false, StatusCache::Snapshot(status)) = (reload, &*cache) {
            return Ok(status.clone());
        }

        let status: BatchStatus = self.client.get_json(&self.endpoint).await?;
        debug!(state = ?status.state, "Batch status fetched");
        *cache = StatusCache::Snapshot(status.clone());
        Ok(status)
    }

    /// Whether the batch has completed.
    ///
    /// Fails with `BatchFailed` whenever the status is in an error state.
    pub async fn is_done(&self, reload: bool) -> Result<bool> {
        let status = self.status(reload).await?;
        if status.is_error() {
            return Err(self.failure(status));
        }
        Ok(status.is_completed())
    }

    fn failure(&self, status: BatchStatus) -> Error {
        Error::new(ErrorKind::BatchFailed {
            job_id: status.job_id.unwrap_or_else(|| self.job_id.clone()),
            batch_id: status.id.unwrap_or_else(|| self.id.clone()),
            state_message: status.state_message.unwrap_or_default(),
        })
    }

    /// Poll until the batch completes or `timeout` worth of sleeping has
    /// elapsed.
    ///
    /// Running out of time is not an error; check [`is_done`](Self::is_done)
    /// afterwards if it matters.
    #[instrument(skip(self), fields(batch_id = %self.id))]
    pub async fn wait(&self, timeout: Duration, poll_interval: Duration) -> Result<()> {
        let mut waited = Duration::ZERO;
        loop {
            if self.is_done(true).await? {
                debug!(?waited, "Batch completed");
                return Ok(());
            }
            // A zero interval would never accumulate toward the timeout.
            if waited >= timeout || poll_interval.is_zero() {
                debug!(?waited, "Gave up waiting for batch");
                return Ok(());
            }

            debug!(?waited, ?poll_interval, "Batch still running");
            sleep(poll_interval).await;
            waited += poll_interval;
        }
    }

    /// [`wait`](Self::wait) with a 10 minute timeout and 10 second interval.
    pub async fn wait_default(&self) -> Result<()> {
        self.wait(DEFAULT_WAIT_TIMEOUT, DEFAULT_POLL_INTERVAL).await
    }

    /// Stream this batch's result records.
    ///
    /// Nothing is requested until the stream is first polled. If the batch
    /// is not known to be done it is waited on first. Query batches fetch
    /// each result chunk only once the previous one has been consumed.
    pub fn results(&self) -> BoxStream<'static, Result<Record>> {
        match self.kind {
            BatchKind::Ingest => self.clone().ingest_results(),
            BatchKind::Query => self.clone().query_results(),
        }
    }

    async fn ensure_done(&self) -> Result<()> {
        if !self.is_done(false).await? {
            self.wait_default().await?;
        }
        Ok(())
    }

    fn result_url(&self) -> String {
        format!("{}/result", self.endpoint)
    }

    fn ingest_results(self) -> BoxStream<'static, Result<Record>> {
        stream::once(async move {
            self.ensure_done().await?;
            let records: Vec<Record> = self.client.get_json(&self.result_url()).await?;
            debug!(batch_id = %self.id, count = records.len(), "Fetched batch results");
            Ok::<_, Error>(stream::iter(records.into_iter().map(Ok::<Record, Error>)))
        })
        .try_flatten()
        .boxed()
    }

    fn query_results(self) -> BoxStream<'static, Result<Record>> {
        stream::once(async move {
            self.ensure_done().await?;
            let result_ids: Vec<String> = self.client.get_json(&self.result_url()).await?;
            debug!(batch_id = %self.id, chunks = result_ids.len(), "Fetched result ids");

            let batch = self;
            let records = stream::iter(result_ids)
                .then(move |result_id| {
                    let batch = batch.clone();
                    async move { batch.fetch_chunk(&result_id).await }
                })
                .map_ok(|chunk| stream::iter(chunk.into_iter().map(Ok::<Record, Error>)))
                .try_flatten();
            Ok::<_, Error>(stop_after_error(records))
        })
        .try_flatten()
        .boxed()
    }

    async fn fetch_chunk(&self, result_id: &str) -> Result<Vec<Record>> {
        let url = format!("{}/{}", self.result_url(), result_id);
        let chunk: Vec<Record> = self.client.get_json(&url).await?;
        debug!(batch_id = %self.id, %result_id, count = chunk.len(), "Fetched result chunk");
        Ok(chunk)
    }
}

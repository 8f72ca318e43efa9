//! # sfbulk-jobs
//!
//! Job and batch lifecycle for the Salesforce Bulk API (async, JSON content).
//!
//! ## Features
//!
//! - **Jobs** - query, insert, update, upsert and delete jobs
//! - **Batching** - rows are split into batches of at most 2500 by default
//! - **Polling** - fixed-interval waits with cached status snapshots
//! - **Streaming results** - records are fetched lazily as the stream is consumed
//! - **Scoped jobs** - [`Job::scoped`] closes the job however the body ends
//!
//! No request is ever retried; every failure reaches the caller.
//!
//! ## Example - Bulk Insert
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//! use sfbulk_jobs::{BulkClient, JobOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sfbulk_jobs::Error> {
//!     let client = BulkClient::new("https://na1.salesforce.com", "session_id")?;
//!
//!     let job = client.create_insert_job("Account", JobOptions::default()).await?;
//!     let outcome = job
//!         .scoped(|job| async move {
//!             job.post_rows(&rows).await?;
//!             job.results().try_collect::<Vec<_>>().await
//!         })
//!         .await?;
//!
//!     println!("{} rows processed", outcome.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Example - Bulk Query
//!
//! ```rust,ignore
//! let job = client.create_query_job("Contact", JobOptions::default()).await?;
//! let batch = job.query("SELECT Id, Email FROM Contact").await?;
//! job.close().await?;
//!
//! let mut records = batch.results();
//! while let Some(record) = records.try_next().await? {
//!     println!("{:?}", record.get("Email"));
//! }
//! ```

mod batch;
mod client;
mod error;
mod job;
mod types;

pub use batch::{Batch, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT};
pub use client::{BulkClient, BulkClientBuilder};
pub use error::{Error, ErrorKind, Result};
pub use job::{Job, DEFAULT_BATCH_SIZE};
pub use types::*;

pub use sfbulk_auth::{Credentials, LoginResult, SessionCredentials};

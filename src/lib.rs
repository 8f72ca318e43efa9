//! # sfbulk
//!
//! A Salesforce Bulk API client for Rust.
//!
//! Submit query, insert, update, upsert and delete jobs; the server splits
//! the work into batches which are polled for completion and whose results
//! are streamed back lazily.
//!
//! ## Security
//!
//! - Session ids and passwords are redacted in Debug output
//! - Tracing spans skip credential parameters
//! - Login failures never echo the request body
//!
//! ## Crates
//!
//! - **sfbulk-client** - HTTP transport, status checking, session-bound requests
//! - **sfbulk-auth** - SOAP username/password login and session credentials
//! - **sfbulk-jobs** - Jobs, batches, polling and result streams
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//! use sfbulk::{BulkClient, JobOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BulkClient::builder()
//!         .username("user@example.com")
//!         .password("passwordTOKEN")
//!         .build()
//!         .await?;
//!
//!     let job = client.create_query_job("Account", JobOptions::default()).await?;
//!     job.query("SELECT Id, Name FROM Account").await?;
//!     job.close().await?;
//!
//!     let accounts: Vec<_> = job.results().try_collect().await?;
//!     for account in accounts {
//!         println!("{}", account["Name"]);
//!     }
//!
//!     Ok(())
//! }
//! ```

// Re-export all crates for convenient access
#[cfg(feature = "auth")]
pub use sfbulk_auth as auth;
#[cfg(feature = "client")]
pub use sfbulk_client as client;
#[cfg(feature = "jobs")]
pub use sfbulk_jobs as jobs;

// Re-export commonly used types at the top level
#[cfg(feature = "auth")]
pub use sfbulk_auth::{Credentials, PasswordCredentials, SessionCredentials};
#[cfg(feature = "client")]
pub use sfbulk_client::ClientConfig;
#[cfg(feature = "jobs")]
pub use sfbulk_jobs::{
    Batch, BatchState, BatchStatus, BulkClient, ConcurrencyMode, Job, JobOptions, Operation,
    Record,
};

//! # sfbulk-client
//!
//! HTTP infrastructure for the Salesforce Bulk API.
//!
//! This crate provides:
//! - A thin HTTP transport over `reqwest` with compression and tracing
//! - Uniform status validation (`Response::check_status`)
//! - A session-bound client that attaches the `X-SFDC-Session` header and
//!   builds `/services/async/{version}` endpoint URLs
//!
//! Requests are sent exactly once. There is no retry, backoff, or rate
//! limiting at this layer; callers see every failure.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! │  (sfbulk-jobs: BulkClient, Job, Batch)                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   SessionClient                             │
//! │  - Holds instance URL + session id + API version            │
//! │  - Typed JSON methods (get_json, post_json, post_text_json) │
//! │  - Adds the X-SFDC-Session header                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SfHttpClient                             │
//! │  - Raw HTTP with compression and request tracing            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use sfbulk_client::SessionClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sfbulk_client::Error> {
//!     let client = SessionClient::new("https://na1.salesforce.com", "00D...")?;
//!
//!     let job: serde_json::Value = client
//!         .get_json(&client.async_url("job/750xx0000000001"))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod request;
mod response;
mod session_client;

pub use client::SfHttpClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, ErrorKind, Result};
pub use request::{RequestBuilder, RequestMethod};
pub use response::Response;
pub use session_client::SessionClient;

/// Default Salesforce API version for the Bulk API.
pub const DEFAULT_API_VERSION: &str = "36.0";

/// Header carrying the session credential on every Bulk API request.
pub const SESSION_HEADER: &str = "X-SFDC-Session";

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("sfbulk/", env!("CARGO_PKG_VERSION"));

//! # sfbulk-auth
//!
//! Session acquisition for the Salesforce Bulk API.
//!
//! ## Security
//!
//! - Session ids and passwords are redacted in Debug output
//! - Tracing spans skip credential parameters
//! - Credentials are XML-escaped before being placed in the login envelope
//!
//! ## Supported Authentication Methods
//!
//! - **SOAP username/password login** - exchanges a username and
//!   password (with security token appended) for a session id
//! - **Existing session** - a session id and instance URL obtained elsewhere
//!
//! ## Example
//!
//! ```rust,ignore
//! use sfbulk_auth::{login, SessionCredentials, PRODUCTION_LOGIN_URL};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sfbulk_auth::Error> {
//!     // From environment variables
//!     let creds = SessionCredentials::from_env()?;
//!
//!     // From a username/password exchange
//!     let session = login("user@example.com", "passwordTOKEN", PRODUCTION_LOGIN_URL, "36.0").await?;
//!     let creds = session.to_credentials("36.0");
//!
//!     Ok(())
//! }
//! ```

mod credentials;
mod error;
mod login;

pub use credentials::{Credentials, PasswordCredentials, SessionCredentials};
pub use error::{Error, ErrorKind, Result};
pub use login::{login, login_with_client, LoginResult};

/// Default Salesforce login URL for production.
pub const PRODUCTION_LOGIN_URL: &str = "https://login.salesforce.com";

/// Default Salesforce login URL for sandbox.
pub const SANDBOX_LOGIN_URL: &str = "https://test.salesforce.com";

/// XML namespace of the partner SOAP API.
pub const PARTNER_NAMESPACE: &str = "urn:partner.soap.sforce.com";

//! Authentication examples for the Bulk API
//!
//! This example demonstrates the ways to obtain a session:
//! - An existing session from environment variables
//! - A SOAP username/password login
//! - The client builder, which does either
//!
//! Run with: cargo run --example basic_auth

use sfbulk::auth::{login, PasswordCredentials, SessionCredentials, PRODUCTION_LOGIN_URL};
use sfbulk::{BulkClient, Credentials};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Bulk API Authentication Examples ===\n");

    example_from_env();
    example_password_login().await;
    example_builder().await;

    Ok(())
}

/// Example 1: Use a session from environment variables
///
/// Required environment variables:
/// - SF_INSTANCE_URL or SALESFORCE_INSTANCE_URL
/// - SF_SESSION_ID or SALESFORCE_SESSION_ID
/// Optional:
/// - SF_API_VERSION or SALESFORCE_API_VERSION
fn example_from_env() {
    println!("Example 1: Session from Environment Variables");
    println!("----------------------------------------------");

    match SessionCredentials::from_env() {
        Ok(creds) => {
            println!("✓ Loaded session from environment");
            println!("  Instance URL: {}", creds.instance_url());
            println!("  API Version: {}", creds.api_version());
            println!("  Debug output: {:?}", creds);
        }
        Err(e) => {
            println!("✗ Failed to load from environment: {}", e);
            println!("  Tip: Set SF_INSTANCE_URL and SF_SESSION_ID");
        }
    }

    println!();
}

/// Example 2: Exchange a username and password for a session
///
/// Required: SF_USERNAME, SF_PASSWORD (with security token appended).
/// Optional: SF_LOGIN_URL (use https://test.salesforce.com for sandboxes).
async fn example_password_login() {
    println!("Example 2: SOAP Username/Password Login");
    println!("---------------------------------------");

    let creds = match PasswordCredentials::from_env() {
        Ok(creds) => creds,
        Err(e) => {
            println!("✗ {}", e);
            println!("  Tip: Set SF_USERNAME and SF_PASSWORD\n");
            return;
        }
    };

    let exchange = login(
        creds.username(),
        creds.password(),
        creds.login_url(),
        creds.api_version(),
    );
    match exchange.await {
        Ok(result) => {
            println!("✓ Logged in");
            println!("  Server URL: {}", result.server_url);
            println!("  Instance URL: {}", result.instance_url);
        }
        Err(e) => println!("✗ Login failed: {}", e),
    }

    // The same exchange through the credentials type
    match creds.login().await {
        Ok(session) => println!("✓ Session for {}", session.instance_url()),
        Err(e) => println!("✗ Login failed: {}", e),
    }

    println!("  Default login host: {}\n", PRODUCTION_LOGIN_URL);
}

/// Example 3: Let the builder pick
///
/// A supplied session is used as is; otherwise the builder logs in.
async fn example_builder() {
    println!("Example 3: Client Builder");
    println!("-------------------------");

    let mut builder = BulkClient::builder();
    if let Ok(creds) = SessionCredentials::from_env() {
        builder = builder.credentials(&creds);
    } else if let Ok(creds) = PasswordCredentials::from_env() {
        builder = builder
            .username(creds.username())
            .password(creds.password())
            .login_url(creds.login_url());
    }

    match builder.build().await {
        Ok(client) => {
            println!("✓ Client ready");
            println!("  Endpoint: {}", client.endpoint());
        }
        Err(e) => println!("✗ {}", e),
    }

    println!();
}

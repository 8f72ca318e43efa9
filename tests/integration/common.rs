use sfbulk_auth::{PasswordCredentials, SessionCredentials};
use sfbulk_jobs::BulkClient;

/// Build a client for integration tests, or `None` when no org is configured.
///
/// An existing session (`SF_INSTANCE_URL` + `SF_SESSION_ID`) is preferred;
/// otherwise `SF_USERNAME` + `SF_PASSWORD` are exchanged for one. Once
/// credentials are present, failing to use them is a test failure.
pub async fn require_client() -> Option<BulkClient> {
    if let Ok(creds) = SessionCredentials::from_env() {
        let client =
            BulkClient::from_credentials(&creds).expect("session credentials should be usable");
        return Some(client);
    }

    let creds = PasswordCredentials::from_env().ok()?;
    let session = creds
        .login()
        .await
        .unwrap_or_else(|e| panic!("login with SF_USERNAME/SF_PASSWORD failed: {e}"));
    Some(BulkClient::from_credentials(&session).expect("login should yield a usable session"))
}

/// Unique suffix for record names created by a test run.
pub fn run_tag() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("sfbulk-{nanos}")
}

//! HTTP response handling.

use serde::de::DeserializeOwned;

use crate::error::{Error, ErrorKind, Result};

/// Wrapper around an HTTP response.
#[derive(Debug)]
pub struct Response {
    inner: reqwest::Response,
}

impl Response {
    pub(crate) fn new(inner: reqwest::Response) -> Self {
        Self { inner }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.inner.status().as_u16()
    }

    /// Returns true if the response status is successful (2xx).
    pub fn is_success(&self) -> bool {
        let status = self.status();
        (200..300).contains(&status)
    }

    /// Validate the status code.
    ///
    /// Any status >= 400 consumes the body and fails with
    /// [`ErrorKind::Http`] carrying the status and the raw body text.
    pub async fn check_status(self) -> Result<Response> {
        let status = self.status();
        if status < 400 {
            return Ok(self);
        }

        let message = self.text().await.unwrap_or_default();
        Err(Error::new(ErrorKind::Http { status, message }))
    }

    /// Get the response body as text.
    pub async fn text(self) -> Result<String> {
        self.inner.text().await.map_err(Into::into)
    }

    /// Deserialize the response body as JSON.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        let body = self.inner.bytes().await?;
        serde_json::from_slice(&body).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn fetch(server: &MockServer, route: &str) -> Response {
        let raw = reqwest::get(format!("{}{}", server.uri(), route))
            .await
            .unwrap();
        Response::new(raw)
    }

    #[tokio::test]
    async fn test_check_status_passes_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "1"})))
            .mount(&server)
            .await;

        let response = fetch(&server, "/ok").await.check_status().await.unwrap();
        assert_eq!(response.status(), 201);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["id"], "1");
    }

    #[tokio::test]
    async fn test_check_status_carries_code_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bad"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"exceptionCode":"InvalidJob","exceptionMessage":"Invalid job id"}"#),
            )
            .mount(&server)
            .await;

        let err = fetch(&server, "/bad")
            .await
            .check_status()
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), Some(400));
        match err.kind {
            ErrorKind::Http { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("InvalidJob"));
            }
            other => panic!("unexpected error kind: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_check_status_passes_redirect_range() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/unchanged"))
            .respond_with(ResponseTemplate::new(304))
            .mount(&server)
            .await;

        let response = fetch(&server, "/unchanged").await.check_status().await;
        assert!(response.is_ok());
    }

    #[tokio::test]
    async fn test_check_status_fails_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = fetch(&server, "/down")
            .await
            .check_status()
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(503));
        assert!(err.to_string().contains("maintenance"));
    }
}

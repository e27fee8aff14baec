//! HTTP execution abstraction for testing.
//!
//! The lookup pipeline talks to the network only through [`HttpExecutor`], so
//! tests can swap in a mock and avoid real network calls.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::{Error, Result};
use crate::types::{HttpRequest, HttpResponse};

/// Trait for executing HTTP requests.
///
/// Implementations must bound the call by their own deadline and report an
/// expired deadline as [`Error::Timeout`].
pub trait HttpExecutor: Send + Sync {
    /// Execute a GET request and return the response, whatever its status.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Production HTTP executor using a blocking reqwest client.
pub struct ReqwestExecutor {
    client: Client,
    timeout: Option<Duration>,
}

impl ReqwestExecutor {
    /// Create a new executor whose requests are bounded by `timeout`, from
    /// connect through reading the body.
    pub fn new(timeout: impl Into<Option<Duration>>) -> Result<Self> {
        let timeout = timeout.into();
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, timeout })
    }

    fn classify(&self, request: &HttpRequest, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::Timeout {
                path: request.display_path.clone(),
                after: self.timeout.unwrap_or_default(),
            }
        } else {
            Error::Transport {
                path: request.display_path.clone(),
                message: error.to_string(),
            }
        }
    }
}

impl HttpExecutor for ReqwestExecutor {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let response = self
            .client
            .get(&request.url)
            .send()
            .map_err(|e| self.classify(request, e))?;

        let status = response.status().as_u16();
        let status_text = response
            .status()
            .canonical_reason()
            .unwrap_or("Unknown")
            .to_string();

        let body_text = response.text().map_err(|e| self.classify(request, e))?;

        Ok(HttpResponse {
            status,
            status_text,
            body_text: Some(body_text),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockExecutor;
    use super::*;

    fn request() -> HttpRequest {
        HttpRequest::get(
            "http://localhost:8500/v1/kv/nodes/a?recurse",
            "http://localhost:8500/v1/kv/nodes/a/",
        )
    }

    #[test]
    fn mock_executor_returns_configured_response() {
        let executor = MockExecutor::ok(r#"[{"Key":"nodes/a/b","Value":null}]"#);
        let response = executor.execute(&request()).unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(
            response.body_text.as_deref(),
            Some(r#"[{"Key":"nodes/a/b","Value":null}]"#)
        );
    }

    #[test]
    fn mock_executor_records_requests() {
        let executor = MockExecutor::status(404);
        executor.execute(&request()).unwrap();
        executor.execute(&request()).unwrap();

        let recorded = executor.recorded_requests();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].url, "http://localhost:8500/v1/kv/nodes/a?recurse");
    }

    #[test]
    fn mock_executor_times_out() {
        let executor = MockExecutor::timing_out(Duration::from_secs(5));
        let err = executor.execute(&request()).unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[test]
    fn mock_executor_fails() {
        let executor = MockExecutor::failing("connection refused");
        let err = executor.execute(&request()).unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn reqwest_executor_creation() {
        let executor = ReqwestExecutor::new(Duration::from_secs(5));
        assert!(executor.is_ok());
    }

    #[test]
    fn reqwest_executor_without_deadline() {
        let executor = ReqwestExecutor::new(None).unwrap();
        assert_eq!(executor.timeout, None);
    }

    #[test]
    fn reqwest_executor_reports_connection_failure_as_transport() {
        // Port 9 (discard) is closed on test hosts; nothing answers.
        let executor = ReqwestExecutor::new(Duration::from_secs(5)).unwrap();
        let request = HttpRequest::get("http://127.0.0.1:9/v1/kv/nodes/a?recurse", "x");
        let err = executor.execute(&request).unwrap_err();
        assert!(matches!(err, Error::Transport { .. } | Error::Timeout { .. }));
    }
}

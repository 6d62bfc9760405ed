//! HTTP transport abstraction for testability.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Bounded per-request timeout for every EDRP API call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure channel for the API client.
///
/// Ordinary operational failure is collapsed into this closed set so callers
/// can distinguish causes in logs and tests without the client ever raising
/// through them. Any `Err` means "no result".
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network-level failure: connection refused, DNS, request timeout.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The remote answered with a non-200 status.
    #[error("unexpected HTTP status {code}")]
    Status {
        /// HTTP status code returned by the remote.
        code: u16,
    },

    /// The remote answered 200 but the payload did not have the required
    /// shape: bad JSON, missing envelope field, or non-numeric count.
    #[error("malformed response payload: {0}")]
    Decode(String),
}

/// Raw HTTP exchange result handed back by a [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

/// Trait for asynchronous HTTP operations against the EDRP API.
///
/// This abstraction allows for dependency injection and easier testing by
/// enabling mock transports in tests. The production implementation is
/// [`ReqwestTransport`].
pub trait Transport: Send + Sync {
    /// Performs an HTTP GET request.
    ///
    /// # Arguments
    /// - `url` - The full URL to request
    ///
    /// # Returns
    /// The status and body, or a transport error.
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, ApiError>> + Send;

    /// Performs an HTTP POST request with an empty body.
    ///
    /// # Arguments
    /// - `url` - The full URL to request
    ///
    /// # Returns
    /// The status and body, or a transport error.
    fn post(&self, url: &str) -> impl Future<Output = Result<HttpResponse, ApiError>> + Send;
}

/// Real HTTP transport backed by reqwest.
///
/// Holds one connection-pooling client for the lifetime of a supervisor run;
/// concurrent calls share it without mutation.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with the standard 10-second request timeout.
    pub fn new() -> Result<Self, ApiError> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// Creates a transport with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<HttpResponse, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, ApiError> {
        self.execute(self.client.get(url)).await
    }

    async fn post(&self, url: &str) -> Result<HttpResponse, ApiError> {
        self.execute(self.client.post(url)).await
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Transport double replaying canned responses and recording requests.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    pub(crate) struct MockTransport {
        responses: Arc<Mutex<VecDeque<Result<HttpResponse, ApiError>>>>,
        requests: Arc<Mutex<Vec<(&'static str, String)>>>,
    }

    impl MockTransport {
        /// A transport that replays `responses` in order.
        pub(crate) fn replying(responses: Vec<Result<HttpResponse, ApiError>>) -> Self {
            Self {
                responses: Arc::new(Mutex::new(responses.into_iter().collect())),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// A transport answering one request with 200 and `body`.
        pub(crate) fn ok(body: &str) -> Self {
            Self::replying(vec![Ok(HttpResponse {
                status: 200,
                body: body.to_string(),
            })])
        }

        /// A transport answering one request with `code` and an empty body.
        pub(crate) fn status(code: u16) -> Self {
            Self::replying(vec![Ok(HttpResponse {
                status: code,
                body: String::new(),
            })])
        }

        /// The `(method, url)` pairs seen so far.
        pub(crate) fn requested(&self) -> Vec<(&'static str, String)> {
            self.requests.lock().unwrap().clone()
        }

        fn next(&self, method: &'static str, url: &str) -> Result<HttpResponse, ApiError> {
            self.requests.lock().unwrap().push((method, url.to_string()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected {method} request to {url}"))
        }
    }

    impl Transport for MockTransport {
        async fn get(&self, url: &str) -> Result<HttpResponse, ApiError> {
            self.next("GET", url)
        }

        async fn post(&self, url: &str) -> Result<HttpResponse, ApiError> {
            self.next("POST", url)
        }
    }
}

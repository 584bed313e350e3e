//! HTTP transport boundary.
//!
//! Every outbound request goes through the [`HttpTransport`] trait so that
//! the token guard, the dispatcher and the fetchers can be exercised without
//! sockets. [`ReqwestTransport`] is the production implementation.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Header names are matched case-insensitively by [`header_get`].
pub type HttpHeaders = Vec<(String, String)>;

/// A GET request.
///
/// The upstream API is read-only from this crate's point of view, so no
/// method or body is modelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: HttpHeaders,
}

impl HttpRequest {
    /// Creates a GET request for `url` without headers.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    /// Appends a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header_get(&self.headers, name)
    }
}

/// A response with its body fully read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpResponse {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header_get(&self.headers, name)
    }

    /// Body decoded as UTF-8, lossily.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum HttpError {
    #[error("http transport error: {0}")]
    Transport(String),

    #[error("no mock response registered for {url}")]
    NoMockResponse { url: String },
}

/// Transport boundary for all HTTP I/O.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// Get the first header value matching `name` (case-insensitive).
#[must_use]
pub fn header_get<'a>(headers: &'a HttpHeaders, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Sends `request`, giving up as soon as `cancel` fires.
///
/// Returns `None` when cancelled.
pub(crate) async fn send_or_cancel(
    transport: &dyn HttpTransport,
    cancel: &CancellationToken,
    request: HttpRequest,
) -> Option<Result<HttpResponse, HttpError>> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => None,
        result = transport.send(request) => Some(result),
    }
}

/// A real HTTP transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Builds a client with a per-request timeout and a crate user agent.
    ///
    /// GitHub rejects requests that carry no `User-Agent`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("starchart/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HttpError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut builder = self.client.get(&request.url);
        for (k, v) in request.headers {
            builder = builder.header(k, v);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        let headers: HttpHeaders = resp
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();

        let body = resp
            .bytes()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?
            .to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockTransport, json_response, status_response};

#[cfg(any(test, feature = "test-util"))]
mod mock {
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{HttpError, HttpRequest, HttpResponse, HttpTransport};

    /// Builds a response with a JSON body and optional ETag.
    #[must_use]
    pub fn json_response(status: u16, body: &serde_json::Value, etag: Option<&str>) -> HttpResponse {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if let Some(etag) = etag {
            headers.push(("ETag".to_string(), etag.to_string()));
        }
        HttpResponse {
            status,
            headers,
            body: body.to_string().into_bytes(),
        }
    }

    /// Builds a response with only a status and a plain-text body.
    #[must_use]
    pub fn status_response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    /// In-memory mock transport.
    ///
    /// Responses are queued per URL and returned in FIFO order; once a queue
    /// holds a single response, that response is repeated. Every request is
    /// recorded, and the peak number of concurrent sends is tracked.
    #[derive(Clone, Default)]
    pub struct MockTransport {
        inner: Arc<Mutex<MockTransportInner>>,
        in_flight: Arc<AtomicUsize>,
        peak_in_flight: Arc<AtomicUsize>,
    }

    #[derive(Default)]
    struct MockTransportInner {
        routes: HashMap<String, VecDeque<(HttpResponse, Duration)>>,
        requests: Vec<HttpRequest>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a response for a URL.
        pub fn push_response(&self, url: impl Into<String>, response: HttpResponse) {
            self.push_delayed(url, response, Duration::ZERO);
        }

        /// Queue a response that is only returned after `delay`.
        pub fn push_delayed(&self, url: impl Into<String>, response: HttpResponse, delay: Duration) {
            let mut inner = self
                .inner
                .lock()
                .expect("mock transport lock should not be poisoned");
            inner
                .routes
                .entry(url.into())
                .or_default()
                .push_back((response, delay));
        }

        #[must_use]
        pub fn requests(&self) -> Vec<HttpRequest> {
            let inner = self
                .inner
                .lock()
                .expect("mock transport lock should not be poisoned");
            inner.requests.clone()
        }

        /// Requests sent to exactly `url`.
        #[must_use]
        pub fn requests_to(&self, url: &str) -> Vec<HttpRequest> {
            self.requests()
                .into_iter()
                .filter(|request| request.url == url)
                .collect()
        }

        /// Highest number of sends observed in flight at once.
        #[must_use]
        pub fn peak_in_flight(&self) -> usize {
            self.peak_in_flight.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

            let next = {
                let mut inner = self
                    .inner
                    .lock()
                    .expect("mock transport lock should not be poisoned");
                let url = request.url.clone();
                inner.requests.push(request);
                let queued = match inner.routes.get_mut(&url) {
                    Some(queue) if queue.len() > 1 => queue.pop_front(),
                    Some(queue) => queue.front().cloned(),
                    None => None,
                };
                queued.ok_or(HttpError::NoMockResponse { url })
            };

            let result = match next {
                Ok((response, delay)) => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    Ok(response)
                }
                Err(err) => Err(err),
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }
}

//! HTTP transport seam.

use std::cell::RefCell;
use std::fmt;
use std::time::Duration;

use futures::future::{FutureExt, LocalBoxFuture};
use url::Url;

const USER_AGENT: &str = concat!("websheet/", env!("CARGO_PKG_VERSION"));

/// Error type for fetches that never produced an HTTP response, or whose
/// 2xx body could not be read.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Connection, timeout or body read failure
    Network(String),
    /// 2xx body is not the expected JSON
    Parse(String),
    /// Base URL or request URL could not be built
    InvalidUrl(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Network(msg) => write!(f, "Network error: {}", msg),
            FetchError::Parse(msg) => write!(f, "Parse error: {}", msg),
            FetchError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request. Implementations never retry.
pub trait HttpTransport {
    fn send(&self, request: HttpRequest) -> LocalBoxFuture<'static, Result<HttpResponse, FetchError>>;
}

/// Async reqwest client; needs a Tokio runtime.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { http })
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> LocalBoxFuture<'static, Result<HttpResponse, FetchError>> {
        let http = self.http.clone();
        async move {
            let method = match request.method {
                HttpMethod::Get => reqwest::Method::GET,
                HttpMethod::Post => reqwest::Method::POST,
                HttpMethod::Put => reqwest::Method::PUT,
                HttpMethod::Patch => reqwest::Method::PATCH,
                HttpMethod::Delete => reqwest::Method::DELETE,
            };

            let mut builder = http.request(method, request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let resp = builder
                .send()
                .await
                .map_err(|e| FetchError::Network(e.to_string()))?;
            let status = resp.status().as_u16();
            let headers = resp
                .headers()
                .iter()
                .map(|(name, value)| {
                    (name.as_str().to_string(), value.to_str().unwrap_or_default().to_string())
                })
                .collect();
            let body = resp
                .text()
                .await
                .map_err(|e| FetchError::Network(e.to_string()))?;

            Ok(HttpResponse { status, headers, body })
        }
        .boxed_local()
    }
}

/// In-process transport with canned responses keyed by method and path.
/// Unrouted requests get a 404. Every request is recorded.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    routes: RefCell<Vec<(HttpMethod, String, Result<HttpResponse, FetchError>)>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` (query ignored) with `response`. Later routes
    /// for the same request win.
    pub fn respond(&self, method: HttpMethod, path: &str, response: HttpResponse) {
        self.routes
            .borrow_mut()
            .push((method, path.to_string(), Ok(response)));
    }

    /// Fail `method path` without a response.
    pub fn fail(&self, method: HttpMethod, path: &str, error: FetchError) {
        self.routes
            .borrow_mut()
            .push((method, path.to_string(), Err(error)));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }
}

impl HttpTransport for MemoryTransport {
    fn send(&self, request: HttpRequest) -> LocalBoxFuture<'static, Result<HttpResponse, FetchError>> {
        let outcome = self
            .routes
            .borrow()
            .iter()
            .rev()
            .find(|(method, path, _)| *method == request.method && path == request.url.path())
            .map(|(_, _, outcome)| outcome.clone())
            .unwrap_or_else(|| Ok(HttpResponse::json(404, "")));
        self.requests.borrow_mut().push(request);
        futures::future::ready(outcome).boxed_local()
    }
}

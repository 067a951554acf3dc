//! HTTP transport.
//!
//! The pipeline hands a fully built [`WireRequest`] to a [`Transport`]; the
//! trait seam lets tests substitute a mock and count calls. The real
//! implementation drives a blocking reqwest client with the request's own
//! timeout and permissive TLS (any certificate is accepted, which is the
//! documented behavior for hitting development servers).

use crate::models::{HttpResponse, HttpVersion, WireRequest};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

/// Errors raised while executing a request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestError {
    /// Connection-level failure (DNS, refused, reset).
    NetworkError(String),
    /// The configured per-request timeout elapsed.
    Timeout(String),
    /// The URL failed to parse or uses an unsupported scheme.
    InvalidUrl(String),
    /// TLS negotiation failed outright.
    TlsError(String),
    /// The client could not be constructed.
    BuildError(String),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            RequestError::Timeout(msg) => write!(f, "Request timed out: {}", msg),
            RequestError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            RequestError::TlsError(msg) => write!(f, "TLS error: {}", msg),
            RequestError::BuildError(msg) => write!(f, "Client build error: {}", msg),
        }
    }
}

impl std::error::Error for RequestError {}

impl From<reqwest::Error> for RequestError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            RequestError::Timeout(error.to_string())
        } else if error.is_builder() {
            RequestError::BuildError(error.to_string())
        } else {
            RequestError::NetworkError(error.to_string())
        }
    }
}

/// Executes wire requests. Implemented by the real HTTP client and by test
/// doubles.
pub trait Transport {
    fn execute(&self, request: &WireRequest) -> Result<HttpResponse, RequestError>;
}

/// Blocking reqwest-backed transport.
#[derive(Debug, Default)]
pub struct HttpTransport;

impl HttpTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &WireRequest) -> Result<HttpResponse, RequestError> {
        validate_url(&request.url)?;

        let mut builder = reqwest::blocking::Client::builder()
            .timeout(request.timeout)
            .danger_accept_invalid_certs(true);
        if request.http_version == HttpVersion::Http2 {
            builder = builder.http2_prior_knowledge();
        }
        let client = builder
            .build()
            .map_err(|e| RequestError::BuildError(e.to_string()))?;

        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| RequestError::BuildError(e.to_string()))?;

        let mut http_request = client.request(method, &request.url);
        for (name, value) in &request.headers {
            http_request = http_request.header(name, value);
        }
        if let Some(body) = &request.body {
            http_request = http_request.body(body.clone());
        }

        log::debug!("sending {} {}", request.method, request.url);
        let start = Instant::now();
        let response = http_request.send()?;
        let status = response.status();

        let mut headers = BTreeMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.to_string(), value.to_string());
            }
        }

        let body = response.bytes()?.to_vec();
        let duration = start.elapsed();

        let header_size: usize = headers
            .iter()
            .map(|(name, value)| name.len() + value.len() + 4)
            .sum();

        let mut result = HttpResponse::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown"),
        );
        result.headers = headers;
        result.size = header_size + body.len();
        result.body = body;
        result.duration = duration;
        Ok(result)
    }
}

/// Rejects malformed URLs and non-HTTP schemes before any I/O.
fn validate_url(url: &str) -> Result<(), RequestError> {
    let parsed = url::Url::parse(url).map_err(|e| RequestError::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(RequestError::InvalidUrl(format!(
            "unsupported scheme: {}",
            scheme
        ))),
    }
}

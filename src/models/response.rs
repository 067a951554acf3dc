//! HTTP response data model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// An HTTP response received from a server.
///
/// The body is kept as raw bytes so binary downloads (archives, PDFs,
/// images) survive intact; textual views are derived on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpResponse {
    /// HTTP status code (e.g., 200, 404, 500).
    pub status_code: u16,

    /// Human-readable status text (e.g., "OK", "Not Found").
    pub status_text: String,

    /// Response headers.
    pub headers: BTreeMap<String, String>,

    /// Raw response body.
    pub body: Vec<u8>,

    /// Total request duration from send to complete response.
    pub duration: Duration,

    /// Approximate response size in bytes (headers + body).
    pub size: usize,
}

impl HttpResponse {
    /// Creates a new response with the given status and empty body.
    pub fn new(status_code: u16, status_text: impl Into<String>) -> Self {
        Self {
            status_code,
            status_text: status_text.into(),
            headers: BTreeMap::new(),
            body: Vec::new(),
            duration: Duration::from_secs(0),
            size: 0,
        }
    }

    /// Whether the status indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body interpreted as UTF-8, lossily.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

//! Outgoing request representations.
//!
//! `RequestDraft` is the mutable view handed to pre-scripts; `WireRequest` is
//! the final encoded form handed to the transport.

use super::node::HttpVersion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// HTTP request method.
///
/// Covers the standard methods from RFC 7231 and RFC 5789.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    OPTIONS,
    HEAD,
    TRACE,
}

impl HttpMethod {
    /// Returns the string representation of the HTTP method.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::TRACE => "TRACE",
        }
    }

    /// Parses a string into an `HttpMethod`, case-insensitively.
    ///
    /// Returns `None` for anything else; the builder turns that into a fatal
    /// configuration error.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Some(HttpMethod::GET),
            "POST" => Some(HttpMethod::POST),
            "PUT" => Some(HttpMethod::PUT),
            "DELETE" => Some(HttpMethod::DELETE),
            "PATCH" => Some(HttpMethod::PATCH),
            "OPTIONS" => Some(HttpMethod::OPTIONS),
            "HEAD" => Some(HttpMethod::HEAD),
            "TRACE" => Some(HttpMethod::TRACE),
            _ => None,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mutable request view exposed to pre-scripts.
///
/// Scripts receive a copy; the caller merges accepted changes back. The node
/// tree itself is never written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDraft {
    /// Method name as entered by the user (validated at build time).
    pub method: String,
    /// URL template, still unresolved.
    pub url: String,
    /// Body template, still unresolved.
    pub body: String,
    /// Resolved headers for this request.
    pub headers: BTreeMap<String, String>,
}

impl RequestDraft {
    pub fn new(
        method: impl Into<String>,
        url: impl Into<String>,
        body: impl Into<String>,
        headers: BTreeMap<String, String>,
    ) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            body: body.into(),
            headers,
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Final wire representation of an outgoing request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireRequest {
    /// Validated HTTP method.
    pub method: HttpMethod,

    /// Fully resolved URL, including any form-derived query string.
    pub url: String,

    /// Merged headers: body-type defaults overridden by explicit user
    /// headers, except the multipart boundary which is authoritative.
    pub headers: BTreeMap<String, String>,

    /// Encoded body bytes, if any.
    pub body: Option<Vec<u8>>,

    /// Human-readable body for logging/display. Differs from `body` for
    /// multipart payloads, which are summarized instead of dumped.
    pub display_body: String,

    /// Protocol version requested from the transport.
    pub http_version: HttpVersion,

    /// Per-request timeout enforced by the transport.
    pub timeout: Duration,
}

impl WireRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_as_str() {
        assert_eq!(HttpMethod::GET.as_str(), "GET");
        assert_eq!(HttpMethod::PATCH.as_str(), "PATCH");
    }

    #[test]
    fn test_method_parse() {
        assert_eq!(HttpMethod::parse("GET"), Some(HttpMethod::GET));
        assert_eq!(HttpMethod::parse("get"), Some(HttpMethod::GET));
        assert_eq!(HttpMethod::parse(" Post "), Some(HttpMethod::POST));
        assert_eq!(HttpMethod::parse("BREW"), None);
        assert_eq!(HttpMethod::parse(""), None);
    }

    #[test]
    fn test_method_display() {
        assert_eq!(format!("{}", HttpMethod::DELETE), "DELETE");
    }

    #[test]
    fn test_draft_header_lookup_case_insensitive() {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        let draft = RequestDraft::new("POST", "https://example.com", "{}", headers);

        assert_eq!(draft.header("content-type"), Some("application/json"));
        assert_eq!(draft.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(draft.header("accept"), None);
    }
}

//! Wire-format request building.
//!
//! Takes the resolved draft (method, URL template, body template, headers)
//! plus the variable context and produces the final [`WireRequest`]:
//! templates resolved, body encoded per its declared type, and headers merged
//! so that explicit user headers always win over body-type defaults. The one
//! exception is the multipart boundary, which is authoritative.

pub mod multipart;

use crate::models::{BodyType, HttpMethod, HttpVersion, WireRequest};
use crate::template;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Fatal request configuration errors.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildError {
    /// The method string does not name a supported HTTP method.
    UnsupportedMethod(String),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::UnsupportedMethod(method) => {
                write!(f, "Unsupported HTTP method: {}", method)
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// Builds the final wire request.
///
/// The caller's header map is only read; merged headers are returned on the
/// `WireRequest`. A GET with a non-blank body is always treated as a form
/// listing appended to the query string, regardless of declared body type.
#[allow(clippy::too_many_arguments)]
pub fn build(
    method: &str,
    url_template: &str,
    body: &str,
    body_type: BodyType,
    context: &BTreeMap<String, String>,
    headers: &BTreeMap<String, String>,
    http_version: HttpVersion,
    timeout_millis: u64,
) -> Result<WireRequest, BuildError> {
    let method = HttpMethod::parse(method)
        .ok_or_else(|| BuildError::UnsupportedMethod(method.to_string()))?;

    let mut url = template::resolve_text(url_template, context);

    let is_get_with_body = method == HttpMethod::GET && !body.trim().is_empty();

    let (body_bytes, display_body, default_headers) =
        if body_type == BodyType::FormEncoded || is_get_with_body {
            let resolved = template::resolve_text(body, context);
            let pairs = parse_listing(&resolved);
            let encoded = encode_pairs(&pairs);

            if method == HttpMethod::GET {
                url = append_query(&url, &encoded);
                (None, String::new(), BTreeMap::new())
            } else {
                let mut defaults = BTreeMap::new();
                defaults.insert(
                    "Content-Type".to_string(),
                    "application/x-www-form-urlencoded".to_string(),
                );
                (Some(encoded.clone().into_bytes()), encoded, defaults)
            }
        } else if body_type == BodyType::Multipart {
            let resolved = template::resolve_text(body, context);
            let pairs = parse_listing(&resolved);
            let payload = multipart::encode(&pairs);
            let display = format!("Multipart upload with {} field(s)", payload.field_count);
            // The boundary header is applied after the user merge below.
            (Some(payload.bytes), display, boundary_header(&payload.boundary))
        } else {
            let resolved = template::resolve_text(body, context);
            if resolved.is_empty() {
                (None, String::new(), BTreeMap::new())
            } else {
                let mut defaults = BTreeMap::new();
                if let Some(content_type) = body_type.default_content_type() {
                    defaults.insert("Content-Type".to_string(), content_type.to_string());
                }
                (Some(resolved.clone().into_bytes()), resolved, defaults)
            }
        };

    let merged = if body_type == BodyType::Multipart && body_bytes.is_some() {
        // User headers first, then the authoritative boundary on top.
        let mut merged = merge_headers(&BTreeMap::new(), headers);
        for (name, value) in &default_headers {
            remove_case_insensitive(&mut merged, name);
            merged.insert(name.clone(), value.clone());
        }
        merged
    } else {
        merge_headers(&default_headers, headers)
    };

    Ok(WireRequest {
        method,
        url,
        headers: merged,
        body: body_bytes,
        display_body,
        http_version,
        timeout: Duration::from_millis(timeout_millis),
    })
}

fn boundary_header(boundary: &str) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert(
        "Content-Type".to_string(),
        format!("multipart/form-data; boundary={}", boundary),
    );
    headers
}

/// Merges defaults with explicit user headers; user entries win on
/// case-insensitive name collision.
fn merge_headers(
    defaults: &BTreeMap<String, String>,
    user: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = defaults.clone();
    for (name, value) in user {
        remove_case_insensitive(&mut merged, name);
        merged.insert(name.clone(), value.clone());
    }
    merged
}

fn remove_case_insensitive(headers: &mut BTreeMap<String, String>, name: &str) {
    let existing: Vec<String> = headers
        .keys()
        .filter(|k| k.eq_ignore_ascii_case(name))
        .cloned()
        .collect();
    for key in existing {
        headers.remove(&key);
    }
}

/// Parses a newline-delimited `key=value` (or `key:value`) listing.
///
/// The first `=` or `:` on each line, whichever comes first, is the
/// separator. Blank lines are skipped; lines without a separator are dropped
/// with a warning.
pub fn parse_listing(text: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.char_indices().find(|(_, c)| *c == '=' || *c == ':') {
            Some((index, _)) => {
                let key = line[..index].trim().to_string();
                let value = line[index + 1..].trim().to_string();
                pairs.push((key, value));
            }
            None => {
                log::warn!("skipping malformed form line: {}", line);
            }
        }
    }
    pairs
}

/// Percent-encodes pairs and joins them with `&`.
fn encode_pairs(pairs: &[(String, String)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// Appends an encoded query string, respecting an existing `?` in the URL.
fn append_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    if url.contains('?') {
        format!("{}&{}", url, query)
    } else {
        format!("{}?{}", url, query)
    }
}

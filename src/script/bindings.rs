//! Script binding types registered with the rhai engine.
//!
//! Proxies wrap pipeline values in `Rc`-shared cells so scripts can read and
//! mutate them through property access and method calls.

use crate::models::{HttpResponse, RequestDraft};
use base64::Engine as _;
use chrono::Utc;
use rand::Rng;
use rhai::{Dynamic, Engine};
use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;
use uuid::Uuid;

/// Read/write proxy over the pending request draft.
#[derive(Debug, Clone)]
pub struct RequestProxy(Rc<RefCell<RequestDraft>>);

impl RequestProxy {
    pub fn new(draft: RequestDraft) -> Self {
        Self(Rc::new(RefCell::new(draft)))
    }

    /// Extracts the (possibly mutated) draft after script execution.
    pub fn into_draft(self) -> RequestDraft {
        self.0.borrow().clone()
    }
}

/// Read-only proxy over the received response.
#[derive(Debug, Clone)]
pub struct ResponseProxy(Rc<HttpResponse>);

impl ResponseProxy {
    pub fn new(response: HttpResponse) -> Self {
        Self(Rc::new(response))
    }
}

/// Console sink capturing script output and forwarding it to the host log.
#[derive(Debug, Clone, Default)]
pub struct ConsoleSink {
    lines: Rc<RefCell<Vec<String>>>,
}

impl ConsoleSink {
    /// Returns all lines logged so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    fn record(&self, level: &str, message: String) {
        match level {
            "warn" => log::warn!(target: "script", "{}", message),
            "error" => log::error!(target: "script", "{}", message),
            _ => log::info!(target: "script", "{}", message),
        }
        self.lines.borrow_mut().push(message);
    }
}

/// Utility helpers exposed to scripts as `utils`.
#[derive(Debug, Clone, Copy)]
pub struct Utils;

/// Registers all proxy types and their members with the engine.
pub fn register(engine: &mut Engine) {
    register_request(engine);
    register_response(engine);
    register_console(engine);
    register_utils(engine);
}

fn register_request(engine: &mut Engine) {
    engine
        .register_type_with_name::<RequestProxy>("Request")
        .register_get_set(
            "method",
            |r: &mut RequestProxy| r.0.borrow().method.clone(),
            |r: &mut RequestProxy, value: String| {
                r.0.borrow_mut().method = value;
            },
        )
        .register_get_set(
            "url",
            |r: &mut RequestProxy| r.0.borrow().url.clone(),
            |r: &mut RequestProxy, value: String| {
                r.0.borrow_mut().url = value;
            },
        )
        .register_get_set(
            "body",
            |r: &mut RequestProxy| r.0.borrow().body.clone(),
            |r: &mut RequestProxy, value: String| {
                r.0.borrow_mut().body = value;
            },
        )
        .register_fn("header", |r: &mut RequestProxy, name: &str| -> Dynamic {
            match r.0.borrow().header(name) {
                Some(value) => value.into(),
                None => Dynamic::UNIT,
            }
        })
        .register_fn(
            "set_header",
            |r: &mut RequestProxy, name: &str, value: &str| {
                r.0.borrow_mut()
                    .headers
                    .insert(name.to_string(), value.to_string());
            },
        );
}

fn register_response(engine: &mut Engine) {
    engine
        .register_type_with_name::<ResponseProxy>("Response")
        .register_get("status", |r: &mut ResponseProxy| r.0.status_code as i64)
        .register_get("status_text", |r: &mut ResponseProxy| {
            r.0.status_text.clone()
        })
        .register_get("body", |r: &mut ResponseProxy| r.0.body_text())
        .register_get("headers", |r: &mut ResponseProxy| {
            let mut map = rhai::Map::new();
            for (name, value) in &r.0.headers {
                map.insert(name.as_str().into(), value.clone().into());
            }
            map
        })
        .register_fn("header", |r: &mut ResponseProxy, name: &str| -> Dynamic {
            match r.0.header(name) {
                Some(value) => value.into(),
                None => Dynamic::UNIT,
            }
        })
        // Attempts to parse the body as JSON; returns unit on failure so
        // scripts can probe with `response.json() == ()`.
        .register_fn("json", |r: &mut ResponseProxy| -> Dynamic {
            match serde_json::from_slice::<serde_json::Value>(&r.0.body) {
                Ok(value) => rhai::serde::to_dynamic(value).unwrap_or(Dynamic::UNIT),
                Err(_) => Dynamic::UNIT,
            }
        });
}

fn register_console(engine: &mut Engine) {
    engine
        .register_type_with_name::<ConsoleSink>("Console")
        .register_fn("log", |c: &mut ConsoleSink, message: Dynamic| {
            c.record("info", message.to_string());
        })
        .register_fn("warn", |c: &mut ConsoleSink, message: Dynamic| {
            c.record("warn", message.to_string());
        })
        .register_fn("error", |c: &mut ConsoleSink, message: Dynamic| {
            c.record("error", message.to_string());
        });
}

fn register_utils(engine: &mut Engine) {
    engine
        .register_type_with_name::<Utils>("Utils")
        .register_fn("uuid", |_: &mut Utils| Uuid::new_v4().to_string())
        .register_fn("timestamp", |_: &mut Utils, pattern: &str| {
            format_timestamp(pattern)
        })
        .register_fn(
            "random_string",
            |_: &mut Utils, length: i64, classes: &str| random_string(length.max(0) as usize, classes),
        )
        .register_fn("base64", |_: &mut Utils, text: &str| {
            base64::engine::general_purpose::STANDARD.encode(text)
        });
}

/// Formats the current UTC time with a chrono pattern, falling back to
/// RFC 3339 when the pattern is invalid.
pub fn format_timestamp(pattern: &str) -> String {
    let now = Utc::now();
    let mut out = String::new();
    if write!(out, "{}", now.format(pattern)).is_ok() {
        out
    } else {
        now.to_rfc3339()
    }
}

/// Generates a random string from a character-class configuration.
///
/// Classes: `a` lower alpha, `u` upper alpha, `n` digits. Repeated letters
/// bias the draw toward that class. Unknown/empty configs use all three.
pub fn random_string(length: usize, classes: &str) -> String {
    const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
    const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    const DIGITS: &str = "0123456789";

    let mut charset = String::new();
    for class in classes.chars() {
        match class {
            'a' => charset.push_str(LOWER),
            'u' => charset.push_str(UPPER),
            'n' => charset.push_str(DIGITS),
            _ => {}
        }
    }
    if charset.is_empty() {
        charset = format!("{}{}{}", LOWER, UPPER, DIGITS);
    }

    let chars: Vec<char> = charset.chars().collect();
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| chars[rng.gen_range(0..chars.len())])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp_pattern() {
        let formatted = format_timestamp("%Y-%m-%d");
        assert_eq!(formatted.len(), 10);
        assert!(formatted.contains('-'));
    }

    #[test]
    fn test_format_timestamp_bad_pattern_falls_back() {
        // %Q is not a valid chrono specifier; output must still be non-empty.
        let formatted = format_timestamp("%Q");
        assert!(!formatted.is_empty());
    }

    #[test]
    fn test_random_string_length_and_classes() {
        let s = random_string(16, "n");
        assert_eq!(s.len(), 16);
        assert!(s.chars().all(|c| c.is_ascii_digit()));

        let s = random_string(12, "anu");
        assert_eq!(s.len(), 12);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_random_string_unknown_class_defaults() {
        let s = random_string(8, "zz");
        assert_eq!(s.len(), 8);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_random_string_zero_length() {
        assert_eq!(random_string(0, "a"), "");
    }

    #[test]
    fn test_console_sink_collects() {
        let console = ConsoleSink::default();
        console.record("info", "one".to_string());
        console.record("warn", "two".to_string());
        assert_eq!(console.lines(), vec!["one".to_string(), "two".to_string()]);
    }
}

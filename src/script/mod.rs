//! Pre/post script execution.
//!
//! Scripts are small rhai programs run against a live request/response
//! context. The host injects a fixed binding set: every resolved variable as
//! an ambient scope variable, a `request` proxy (read/write), a `response`
//! proxy (post-script only), a `console` sink, and `utils` helpers.
//!
//! Scripts operate on copies. A pre-script's scope mutations are harvested
//! into a fresh context map and a fresh request draft which the caller merges
//! forward; persistent node data is never touched.
//!
//! Failure semantics differ by phase: a pre-script error aborts the send
//! before any network I/O, while a post-script error is reported alongside
//! the already-obtained response.

pub mod bindings;

pub use bindings::ConsoleSink;

use crate::models::{HttpResponse, RequestDraft};
use bindings::{RequestProxy, ResponseProxy};
use rhai::{Dynamic, Engine, Scope};
use std::collections::BTreeMap;
use std::fmt;

/// Upper bound on abstract operations per script evaluation.
///
/// The original tool let a hung script block its worker forever; bounding the
/// engine turns a runaway script into a phase error instead.
const MAX_SCRIPT_OPERATIONS: u64 = 1_000_000;

/// Errors produced while evaluating a user script.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptError {
    /// The script failed to parse or raised a runtime error.
    Evaluation(String),
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::Evaluation(msg) => write!(f, "Script error: {}", msg),
        }
    }
}

impl std::error::Error for ScriptError {}

/// Reserved binding names that are never harvested back into the context.
const FIXED_BINDINGS: &[&str] = &["request", "response", "console", "utils"];

/// Host for pre-request and post-response scripts.
pub struct ScriptHost {
    engine: Engine,
}

impl ScriptHost {
    /// Creates a host with all proxy types and utility functions registered.
    pub fn new() -> Self {
        let mut engine = Engine::new();
        engine.set_max_operations(MAX_SCRIPT_OPERATIONS);
        bindings::register(&mut engine);
        Self { engine }
    }

    /// Runs a pre-request script.
    ///
    /// On success returns the (possibly mutated) context copy and request
    /// draft. On failure the caller must abort the send.
    pub fn run_pre(
        &self,
        script: &str,
        context: &BTreeMap<String, String>,
        draft: &RequestDraft,
        console: &ConsoleSink,
    ) -> Result<(BTreeMap<String, String>, RequestDraft), ScriptError> {
        let request = RequestProxy::new(draft.clone());
        let mut scope = Scope::new();
        push_context(&mut scope, context);
        scope.push("request", request.clone());
        scope.push("console", console.clone());
        scope.push("utils", bindings::Utils);

        let _ = self
            .engine
            .eval_with_scope::<Dynamic>(&mut scope, script)
            .map_err(|e| ScriptError::Evaluation(e.to_string()))?;

        let mutated = harvest_context(&scope);
        Ok((mutated, request.into_draft()))
    }

    /// Runs a post-response script.
    ///
    /// The response is exposed read-only; context mutations are discarded
    /// since the request has already been sent.
    pub fn run_post(
        &self,
        script: &str,
        context: &BTreeMap<String, String>,
        draft: &RequestDraft,
        response: &HttpResponse,
        console: &ConsoleSink,
    ) -> Result<(), ScriptError> {
        let mut scope = Scope::new();
        push_context(&mut scope, context);
        scope.push("request", RequestProxy::new(draft.clone()));
        scope.push("response", ResponseProxy::new(response.clone()));
        scope.push("console", console.clone());
        scope.push("utils", bindings::Utils);

        let _ = self
            .engine
            .eval_with_scope::<Dynamic>(&mut scope, script)
            .map_err(|e| ScriptError::Evaluation(e.to_string()))?;
        Ok(())
    }
}

impl Default for ScriptHost {
    fn default() -> Self {
        Self::new()
    }
}

/// Pushes every identifier-safe context entry as an ambient scope variable.
///
/// Keys that are not valid identifiers (or that collide with the fixed
/// bindings) stay reachable through templating only, matching the original
/// tool's ambient-name injection.
fn push_context(scope: &mut Scope, context: &BTreeMap<String, String>) {
    for (key, value) in context {
        if is_valid_identifier(key) && !FIXED_BINDINGS.contains(&key.as_str()) {
            scope.push(key.clone(), value.clone());
        }
    }
}

/// Collects plain-valued scope variables back into a context map.
///
/// Strings, integers, floats, booleans and chars are flattened to strings;
/// structured values (maps, arrays, proxies) are ignored. Later shadowing
/// entries win.
fn harvest_context(scope: &Scope) -> BTreeMap<String, String> {
    let mut harvested = BTreeMap::new();
    for (name, _is_constant, value) in scope.iter() {
        if FIXED_BINDINGS.contains(&name) {
            continue;
        }
        if let Some(plain) = plain_string(&value) {
            harvested.insert(name.to_string(), plain);
        }
    }
    harvested
}

fn plain_string(value: &Dynamic) -> Option<String> {
    if value.is::<rhai::ImmutableString>() || value.is::<String>() {
        value.clone().into_string().ok()
    } else if value.is::<i64>() || value.is::<f64>() || value.is::<bool>() || value.is::<char>() {
        Some(value.to_string())
    } else {
        None
    }
}

fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> RequestDraft {
        RequestDraft::new("POST", "https://example.com/api", "{}", BTreeMap::new())
    }

    fn ctx(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_pre_script_reads_ambient_variables() {
        let host = ScriptHost::new();
        let console = ConsoleSink::default();
        let context = ctx(&[("token", "abc123")]);

        let (_, updated) = host
            .run_pre(
                r#"request.set_header("Authorization", "Bearer " + token);"#,
                &context,
                &draft(),
                &console,
            )
            .unwrap();

        assert_eq!(updated.header("Authorization"), Some("Bearer abc123"));
    }

    #[test]
    fn test_pre_script_mutates_context_copy() {
        let host = ScriptHost::new();
        let console = ConsoleSink::default();
        let context = ctx(&[("counter", "1")]);

        let (mutated, _) = host
            .run_pre("counter = \"2\"; let fresh = \"new\";", &context, &draft(), &console)
            .unwrap();

        assert_eq!(mutated.get("counter"), Some(&"2".to_string()));
        assert_eq!(mutated.get("fresh"), Some(&"new".to_string()));
    }

    #[test]
    fn test_pre_script_rewrites_request() {
        let host = ScriptHost::new();
        let console = ConsoleSink::default();

        let (_, updated) = host
            .run_pre(
                r#"request.url = "https://other.example.com"; request.method = "PUT";"#,
                &BTreeMap::new(),
                &draft(),
                &console,
            )
            .unwrap();

        assert_eq!(updated.url, "https://other.example.com");
        assert_eq!(updated.method, "PUT");
    }

    #[test]
    fn test_pre_script_error_is_reported() {
        let host = ScriptHost::new();
        let console = ConsoleSink::default();

        let result = host.run_pre("no_such_function();", &BTreeMap::new(), &draft(), &console);
        assert!(matches!(result, Err(ScriptError::Evaluation(_))));
    }

    #[test]
    fn test_runaway_script_is_bounded() {
        let host = ScriptHost::new();
        let console = ConsoleSink::default();

        let result = host.run_pre(
            "let i = 0; while true { i += 1; }",
            &BTreeMap::new(),
            &draft(),
            &console,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_post_script_sees_response() {
        let host = ScriptHost::new();
        let console = ConsoleSink::default();

        let mut response = HttpResponse::new(201, "Created");
        response.body = br#"{"id": 7}"#.to_vec();

        host.run_post(
            r#"
                if response.status != 201 { throw "unexpected status"; }
                let data = response.json();
                console.log("created id " + data.id);
            "#,
            &BTreeMap::new(),
            &draft(),
            &response,
            &console,
        )
        .unwrap();

        let lines = console.lines();
        assert_eq!(lines, vec!["created id 7".to_string()]);
    }

    #[test]
    fn test_post_script_json_parse_failure_yields_unit() {
        let host = ScriptHost::new();
        let console = ConsoleSink::default();

        let mut response = HttpResponse::new(200, "OK");
        response.body = b"not json".to_vec();

        host.run_post(
            r#"
                let data = response.json();
                if data == () { console.log("no structured body"); }
            "#,
            &BTreeMap::new(),
            &draft(),
            &response,
            &console,
        )
        .unwrap();

        assert_eq!(console.lines(), vec!["no structured body".to_string()]);
    }

    #[test]
    fn test_post_script_error_is_reported() {
        let host = ScriptHost::new();
        let console = ConsoleSink::default();
        let response = HttpResponse::new(500, "Internal Server Error");

        let result = host.run_post(
            r#"throw "backend broke";"#,
            &BTreeMap::new(),
            &draft(),
            &response,
            &console,
        );
        assert!(matches!(result, Err(ScriptError::Evaluation(_))));
    }

    #[test]
    fn test_utils_bindings() {
        let host = ScriptHost::new();
        let console = ConsoleSink::default();

        let (mutated, _) = host
            .run_pre(
                r#"
                    let id = utils.uuid();
                    let rand = utils.random_string(8, "anu");
                    let encoded = utils.base64("user:pass");
                "#,
                &BTreeMap::new(),
                &draft(),
                &console,
            )
            .unwrap();

        assert_eq!(mutated.get("id").unwrap().len(), 36);
        assert_eq!(mutated.get("rand").unwrap().len(), 8);
        assert_eq!(mutated.get("encoded").unwrap(), "dXNlcjpwYXNz");
    }

    #[test]
    fn test_invalid_identifier_keys_skipped() {
        let host = ScriptHost::new();
        let console = ConsoleSink::default();
        let context = ctx(&[("my-key", "dashed"), ("ok", "fine")]);

        // `my-key` cannot be an ambient variable; the script still runs.
        let (mutated, _) = host
            .run_pre("let seen = ok;", &context, &draft(), &console)
            .unwrap();
        assert_eq!(mutated.get("seen"), Some(&"fine".to_string()));
        assert!(mutated.get("my-key").is_none());
    }

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("token"));
        assert!(is_valid_identifier("_private"));
        assert!(is_valid_identifier("a1_b2"));
        assert!(!is_valid_identifier("1abc"));
        assert!(!is_valid_identifier("with-dash"));
        assert!(!is_valid_identifier(""));
    }
}

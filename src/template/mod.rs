//! Template evaluation engine.
//!
//! Templates carry placeholders in two equivalent forms: `${name}` (the
//! canonical form) and `{{ name }}` (with optional interior whitespace). A
//! normalization step rewrites the latter to the former, then evaluation
//! renders placeholders against a variable context.
//!
//! Evaluation is iterative: every pass re-renders the text against the latest
//! values, so a value may reference other keys that are themselves templates.
//! The loop stops when a pass produces no change or after [`MAX_PASSES`],
//! which bounds cyclic or runaway references: non-convergent input settles
//! on its last (possibly partial) rendering instead of looping.
//!
//! Evaluation is fail-soft: an unresolvable placeholder is left as literal
//! text, so one bad key never blocks unrelated keys. There is no error type
//! here by design.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// Fixed cap on evaluation passes.
///
/// Ten passes resolve any reference chain ten levels deep; anything that has
/// not converged by then is cyclic or effectively unbounded.
pub const MAX_PASSES: usize = 10;

/// Matches `{{ name }}` placeholders with optional interior whitespace.
static MUSTACHE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([^}\s][^}]*?)\s*\}\}").expect("mustache regex"));

/// Matches canonical `${name}` placeholders.
static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder regex"));

/// Rewrites all `{{ name }}` occurrences to the canonical `${name}` form.
///
/// Brace-free `$name` is deliberately not recognized; it was never portable
/// across the historical implementations.
pub fn normalize(template: &str) -> String {
    if !template.contains("{{") {
        return template.to_string();
    }
    MUSTACHE_REGEX.replace_all(template, "$${$1}").into_owned()
}

/// Renders one pass: each `${name}` is replaced by its context value, or left
/// literal when the name is unknown.
fn render_once(text: &str, vars: &BTreeMap<String, String>) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last_match_end = 0;

    for cap in PLACEHOLDER_REGEX.captures_iter(text) {
        let full_match = cap.get(0).expect("group 0 always present");
        let name = cap.get(1).expect("group 1 always present").as_str().trim();

        result.push_str(&text[last_match_end..full_match.start()]);
        match vars.get(name) {
            Some(value) => result.push_str(value),
            None => result.push_str(full_match.as_str()),
        }
        last_match_end = full_match.end();
    }

    result.push_str(&text[last_match_end..]);
    result
}

/// Resolves a single template string against a variable context.
///
/// Runs bounded fixed-point iteration: each pass normalizes and re-renders
/// the current text; the loop stops when a pass changes nothing or the pass
/// cap is reached.
pub fn resolve_text(template: &str, context: &BTreeMap<String, String>) -> String {
    let mut current = normalize(template);

    for _ in 0..MAX_PASSES {
        let rendered = render_once(&normalize(&current), context);
        if rendered == current {
            break;
        }
        current = rendered;
    }
    current
}

/// Resolves a map of templates where values may reference the external
/// context and each other.
///
/// Each pass takes a snapshot of the working map layered over the external
/// context (working entries win on collision) and re-renders every value
/// against it. Another pass runs only if some value changed.
pub fn resolve_map(
    templates: &BTreeMap<String, String>,
    context: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut working: BTreeMap<String, String> = templates
        .iter()
        .map(|(key, value)| (key.clone(), normalize(value)))
        .collect();

    for _ in 0..MAX_PASSES {
        let mut snapshot = context.clone();
        snapshot.extend(working.clone());

        let mut changed = false;
        for value in working.values_mut() {
            let rendered = render_once(&normalize(value), &snapshot);
            if rendered != *value {
                *value = rendered;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    working
}

//! Scope resolution along the ancestor chain.
//!
//! Environment variables, headers, and scripts are inherited from the
//! collection root down to each node. Resolution is a pure fold over an
//! immutable tree snapshot: at every level the current node's entries
//! override the parent's on key collision, so the node closest to the target
//! always wins. Collection `global_variables` are merged first and therefore
//! carry the lowest precedence (see DESIGN.md).
//!
//! Results use `BTreeMap`, giving the lexicographic key order that template
//! evaluation and display rely on for reproducibility.

use crate::models::Node;
use crate::template;
use std::collections::BTreeMap;

/// Resolves the merged environment for the node with the given id.
///
/// Returns the deep union of the collection's global variables and every
/// `environment` map on the root→node path, nearer nodes overriding farther
/// ones. An unknown id yields an empty map; absence of data is not a failure.
pub fn resolve_environment(root: &Node, node_id: &str) -> BTreeMap<String, String> {
    let path = match root.path_to(node_id) {
        Some(path) => path,
        None => return BTreeMap::new(),
    };

    let mut merged = root
        .global_variables()
        .cloned()
        .unwrap_or_default();

    for node in path {
        for (key, value) in &node.environment {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Resolves the merged headers for the node with the given id.
///
/// Headers are collected raw along the whole chain and template-substituted
/// only once at the final level, so partially merged values are never
/// resolved against an incomplete context.
pub fn resolve_headers(
    root: &Node,
    node_id: &str,
    context: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let path = match root.path_to(node_id) {
        Some(path) => path,
        None => return BTreeMap::new(),
    };

    let mut merged: BTreeMap<String, String> = BTreeMap::new();
    for node in path {
        for (key, value) in &node.headers {
            merged.insert(key.clone(), value.clone());
        }
    }

    merged
        .into_iter()
        .map(|(key, value)| {
            let resolved = template::resolve_text(&value, context);
            (key, resolved)
        })
        .collect()
}

/// Returns the effective pre-request script for the node: its own, or the
/// nearest ancestor's. Blank scripts count as "not set".
pub fn resolve_prescript<'a>(root: &'a Node, node_id: &str) -> Option<&'a str> {
    resolve_script(root, node_id, |node| node.prescript.as_deref())
}

/// Returns the effective post-response script for the node: its own, or the
/// nearest ancestor's. Blank scripts count as "not set".
pub fn resolve_postscript<'a>(root: &'a Node, node_id: &str) -> Option<&'a str> {
    resolve_script(root, node_id, |node| node.postscript.as_deref())
}

fn resolve_script<'a>(
    root: &'a Node,
    node_id: &str,
    pick: impl Fn(&'a Node) -> Option<&'a str>,
) -> Option<&'a str> {
    let path = root.path_to(node_id)?;
    path.iter()
        .rev()
        .filter_map(|node| pick(node))
        .find(|script| !script.trim().is_empty())
}

//! Project tree data model.
//!
//! A project is a tree of nodes: exactly one `Collection` root, any number of
//! nested `Folder` containers, and `Request` leaves. Every node carries its
//! own environment variables, default headers, and optional pre/post scripts;
//! the scope resolver merges these along the ancestor chain.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declared encoding of a request body.
///
/// Unknown values encountered during deserialization fall back to `Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BodyType {
    /// JSON body (application/json).
    Json,
    /// XML body (application/xml).
    Xml,
    /// Newline-delimited key=value listing, percent-encoded on send.
    FormEncoded,
    /// Newline-delimited key=value listing encoded as multipart/form-data,
    /// with `file:` values embedding file contents.
    Multipart,
    /// Raw text body (text/plain). Kept last: the catch-all variant for
    /// unrecognized wire values must close the enum.
    #[default]
    #[serde(other)]
    Text,
}

impl BodyType {
    /// Returns the default Content-Type for this body type, if it has one.
    ///
    /// `FormEncoded` and `Multipart` manage their own content types inside
    /// the request builder.
    pub fn default_content_type(&self) -> Option<&'static str> {
        match self {
            BodyType::Text => Some("text/plain"),
            BodyType::Json => Some("application/json"),
            BodyType::Xml => Some("application/xml"),
            BodyType::FormEncoded | BodyType::Multipart => None,
        }
    }

    /// Parses a body type from its wire name, defaulting to `Text` for
    /// anything unrecognized.
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "JSON" => BodyType::Json,
            "XML" => BodyType::Xml,
            "FORM_ENCODED" => BodyType::FormEncoded,
            "MULTIPART" => BodyType::Multipart,
            _ => BodyType::Text,
        }
    }
}

/// HTTP protocol version for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HttpVersion {
    /// HTTP/1.1 (default).
    #[default]
    #[serde(rename = "HTTP/1.1")]
    Http11,
    /// HTTP/2 (prior knowledge).
    #[serde(rename = "HTTP/2")]
    Http2,
}

impl HttpVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVersion::Http11 => "HTTP/1.1",
            HttpVersion::Http2 => "HTTP/2",
        }
    }
}

/// Request-specific configuration stored on a `Request` leaf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    /// HTTP method name as entered by the user (validated at build time).
    pub method: String,

    /// URL template; may contain `${name}` / `{{ name }}` placeholders.
    pub url: String,

    /// Raw body template. Interpretation depends on `body_type`.
    pub body: String,

    /// Declared body encoding.
    #[serde(default)]
    pub body_type: BodyType,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_millis")]
    pub timeout_millis: u64,

    /// HTTP protocol version.
    #[serde(default)]
    pub http_version: HttpVersion,

    /// When set, the response body is treated as a download: sniffed for a
    /// file extension, saved to a temp file, and opened with the OS.
    #[serde(default)]
    pub download_content: bool,
}

fn default_timeout_millis() -> u64 {
    30_000
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            url: String::new(),
            body: String::new(),
            body_type: BodyType::Text,
            timeout_millis: default_timeout_millis(),
            http_version: HttpVersion::Http11,
            download_content: false,
        }
    }
}

/// Closed variant set for a node.
///
/// Shared fields live on [`Node`]; the variant only adds what is specific to
/// each kind, replacing subclass downcasts with a capability check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    /// Project root. Owns the collection-wide variable defaults.
    Collection {
        /// Lowest-precedence variables, overridable by any node environment.
        #[serde(default)]
        global_variables: BTreeMap<String, String>,
        /// UI-only: id of the last selected node. Ignored by the pipeline.
        #[serde(default)]
        last_selected_node_id: Option<String>,
    },
    /// Intermediate container.
    Folder,
    /// Leaf holding an executable request.
    Request(RequestConfig),
}

/// An entry in the project hierarchy.
///
/// The tree exclusively owns its children; the pipeline only ever reads a
/// consistent snapshot and never mutates node data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Opaque stable identity.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Variables scoped to this node and its descendants.
    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    /// Default headers scoped to this node and its descendants.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Pre-request script source. Blank counts as "not set" for inheritance.
    #[serde(default)]
    pub prescript: Option<String>,

    /// Post-response script source. Blank counts as "not set" for inheritance.
    #[serde(default)]
    pub postscript: Option<String>,

    /// UI-only tab index. Ignored by the pipeline.
    #[serde(default)]
    pub selected_tab_index: usize,

    /// Variant-specific data.
    pub kind: NodeKind,

    /// Ordered children. Always empty for `Request` leaves.
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Node {
    /// Creates a new collection root.
    pub fn collection(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(
            id,
            name,
            NodeKind::Collection {
                global_variables: BTreeMap::new(),
                last_selected_node_id: None,
            },
        )
    }

    /// Creates a new folder.
    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, NodeKind::Folder)
    }

    /// Creates a new request leaf with the given configuration.
    pub fn request(id: impl Into<String>, name: impl Into<String>, config: RequestConfig) -> Self {
        Self::new(id, name, NodeKind::Request(config))
    }

    fn new(id: impl Into<String>, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            environment: BTreeMap::new(),
            headers: BTreeMap::new(),
            prescript: None,
            postscript: None,
            selected_tab_index: 0,
            kind,
            children: Vec::new(),
        }
    }

    /// Whether this node may hold children.
    pub fn is_container(&self) -> bool {
        matches!(self.kind, NodeKind::Collection { .. } | NodeKind::Folder)
    }

    /// Returns the request configuration if this is a `Request` leaf.
    pub fn request_config(&self) -> Option<&RequestConfig> {
        match &self.kind {
            NodeKind::Request(config) => Some(config),
            _ => None,
        }
    }

    /// Returns the collection's global variables if this is the root.
    pub fn global_variables(&self) -> Option<&BTreeMap<String, String>> {
        match &self.kind {
            NodeKind::Collection {
                global_variables, ..
            } => Some(global_variables),
            _ => None,
        }
    }

    /// Adds a child, returning `&mut self` for chaining during tree setup.
    ///
    /// Children on leaves are rejected silently in release builds; the
    /// external tree editor is responsible for structural validity.
    pub fn add_child(&mut self, child: Node) -> &mut Self {
        debug_assert!(self.is_container(), "leaf nodes cannot hold children");
        if self.is_container() {
            self.children.push(child);
        }
        self
    }

    /// Finds a node by id anywhere in this subtree.
    pub fn find(&self, id: &str) -> Option<&Node> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Returns the root→target path of nodes, or `None` if `id` is absent.
    pub fn path_to(&self, id: &str) -> Option<Vec<&Node>> {
        if self.id == id {
            return Some(vec![self]);
        }
        for child in &self.children {
            if let Some(mut path) = child.path_to(id) {
                path.insert(0, self);
                return Some(path);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> Node {
        let mut root = Node::collection("root", "My Project");
        let mut folder = Node::folder("f1", "Auth");
        folder.add_child(Node::request("r1", "Login", RequestConfig::default()));
        root.add_child(folder);
        root.add_child(Node::request("r2", "Health", RequestConfig::default()));
        root
    }

    #[test]
    fn test_body_type_parse_or_default() {
        assert_eq!(BodyType::parse_or_default("JSON"), BodyType::Json);
        assert_eq!(BodyType::parse_or_default("xml"), BodyType::Xml);
        assert_eq!(
            BodyType::parse_or_default("FORM_ENCODED"),
            BodyType::FormEncoded
        );
        assert_eq!(BodyType::parse_or_default("MULTIPART"), BodyType::Multipart);
        assert_eq!(BodyType::parse_or_default("bogus"), BodyType::Text);
        assert_eq!(BodyType::parse_or_default(""), BodyType::Text);
    }

    #[test]
    fn test_body_type_default_content_type() {
        assert_eq!(BodyType::Json.default_content_type(), Some("application/json"));
        assert_eq!(BodyType::Xml.default_content_type(), Some("application/xml"));
        assert_eq!(BodyType::Text.default_content_type(), Some("text/plain"));
        assert_eq!(BodyType::FormEncoded.default_content_type(), None);
        assert_eq!(BodyType::Multipart.default_content_type(), None);
    }

    #[test]
    fn test_body_type_unknown_deserializes_to_text() {
        let parsed: BodyType = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(parsed, BodyType::Text);

        let parsed: BodyType = serde_json::from_str("\"MULTIPART\"").unwrap();
        assert_eq!(parsed, BodyType::Multipart);
    }

    #[test]
    fn test_is_container() {
        let tree = sample_tree();
        assert!(tree.is_container());
        assert!(tree.find("f1").unwrap().is_container());
        assert!(!tree.find("r1").unwrap().is_container());
    }

    #[test]
    fn test_find_and_path() {
        let tree = sample_tree();
        assert_eq!(tree.find("r1").unwrap().name, "Login");
        assert!(tree.find("missing").is_none());

        let path = tree.path_to("r1").unwrap();
        let ids: Vec<&str> = path.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["root", "f1", "r1"]);

        assert!(tree.path_to("missing").is_none());
    }

    #[test]
    fn test_request_config_accessors() {
        let tree = sample_tree();
        assert!(tree.find("r1").unwrap().request_config().is_some());
        assert!(tree.find("f1").unwrap().request_config().is_none());
        assert!(tree.global_variables().is_some());
        assert!(tree.find("f1").unwrap().global_variables().is_none());
    }

    #[test]
    fn test_node_serialization_round_trip() {
        let tree = sample_tree();
        let json = serde_json::to_string(&tree).unwrap();
        let parsed: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, "root");
        assert_eq!(parsed.children.len(), 2);
        assert!(parsed.find("r1").is_some());
    }

    #[test]
    fn test_http_version_as_str() {
        assert_eq!(HttpVersion::Http11.as_str(), "HTTP/1.1");
        assert_eq!(HttpVersion::Http2.as_str(), "HTTP/2");
    }
}

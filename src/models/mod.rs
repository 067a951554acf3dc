//! Core data models.
//!
//! This module defines the project tree (`Node` and its variants), the HTTP
//! request/response structures, and the draft/wire representations that flow
//! through the preparation pipeline.

pub mod node;
pub mod request;
pub mod response;

pub use node::{BodyType, HttpVersion, Node, NodeKind, RequestConfig};
pub use request::{HttpMethod, RequestDraft, WireRequest};
pub use response::HttpResponse;

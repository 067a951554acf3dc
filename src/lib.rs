//! requestlab - request preparation pipeline for a collection-based HTTP tool
//!
//! The crate turns a node tree (collections, folders, requests) plus a target
//! request id into an executed HTTP call:
//!
//! 1. [`scope`] merges environment variables, headers, and scripts along the
//!    ancestor chain, nearer nodes overriding farther ones.
//! 2. [`template`] resolves `${name}` / `{{ name }}` placeholders with
//!    bounded fixed-point iteration; unresolvable placeholders stay literal.
//! 3. [`script`] runs the pre-request script (fatal on error) and later the
//!    post-response script (non-fatal) with request/response proxies bound.
//! 4. [`builder`] encodes the wire request: form/multipart/raw bodies, query
//!    appending for GET forms, and header precedence rules.
//! 5. [`transport`] executes the request with the configured timeout.
//! 6. [`classifier`] picks a file extension for flagged downloads, telling
//!    OOXML documents apart from generic zip archives.
//!
//! [`pipeline::Pipeline`] orchestrates the whole sequence and reports a
//! structured [`pipeline::ExecutionOutcome`]; [`history`] appends a
//! human-readable record per send.

pub mod builder;
pub mod classifier;
pub mod formatter;
pub mod history;
pub mod models;
pub mod pipeline;
pub mod scope;
pub mod script;
pub mod template;
pub mod transport;

pub use models::{
    BodyType, HttpMethod, HttpResponse, HttpVersion, Node, NodeKind, RequestConfig, RequestDraft,
    WireRequest,
};
pub use pipeline::{ExecutionOutcome, Pipeline, PipelineOptions, SendPhase};
pub use transport::{HttpTransport, RequestError, Transport};

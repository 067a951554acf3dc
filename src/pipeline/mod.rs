//! The send pipeline.
//!
//! One send is one synchronous unit of work: scope resolution, template
//! evaluation, pre-script, request building, network I/O, post-script, and
//! download classification, in that order. The pre-script always finishes
//! (or aborts) strictly before any network I/O; the network call always
//! finishes before the post-script runs.
//!
//! All inputs are snapshots. The node tree is only read, and scripts operate
//! on copies of the resolved context, so a concurrent tree edit can never
//! race an in-flight send.

use crate::builder;
use crate::classifier;
use crate::formatter;
use crate::history::{ExecutionRecord, HistoryLog};
use crate::models::{HttpResponse, Node, RequestDraft};
use crate::scope;
use crate::script::{ConsoleSink, ScriptHost};
use crate::transport::Transport;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

/// Phase reached when the pipeline stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPhase {
    Idle,
    PreScriptRunning,
    RequestBuilding,
    Sent,
    PostScriptRunning,
    Done,
    Aborted,
}

/// Where a flagged download ended up.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    /// Classified extension with leading dot; empty when unrecognized.
    pub extension: String,
    /// Saved file path, when writing succeeded.
    pub path: Option<PathBuf>,
}

/// Everything the UI layer needs to display one send.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub phase: SendPhase,
    pub method: String,
    pub url: String,
    pub request_headers: BTreeMap<String, String>,
    pub request_body: String,
    pub response: Option<HttpResponse>,
    /// Response body pretty-printed when JSON/XML parse-detection succeeds.
    pub pretty_body: Option<String>,
    /// Fatal error for this send, when one occurred.
    pub error: Option<String>,
    /// Non-fatal post-script error, reported alongside the response.
    pub post_script_error: Option<String>,
    pub console: Vec<String>,
    pub duration_ms: u128,
    pub download: Option<DownloadOutcome>,
}

impl ExecutionOutcome {
    fn aborted(error: String) -> Self {
        Self {
            phase: SendPhase::Aborted,
            method: String::new(),
            url: String::new(),
            request_headers: BTreeMap::new(),
            request_body: String::new(),
            response: None,
            pretty_body: None,
            error: Some(error),
            post_script_error: None,
            console: Vec::new(),
            duration_ms: 0,
            download: None,
        }
    }
}

/// Pipeline behavior knobs.
#[derive(Debug, Default)]
pub struct PipelineOptions {
    /// Save and open flagged downloads with the OS default application.
    /// Off in headless/test runs.
    pub auto_open_downloads: bool,
    /// Optional per-project history log.
    pub history: Option<HistoryLog>,
}

/// Orchestrates one request send over a transport.
pub struct Pipeline<'a> {
    transport: &'a dyn Transport,
    script_host: ScriptHost,
    options: PipelineOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(transport: &'a dyn Transport, options: PipelineOptions) -> Self {
        Self {
            transport,
            script_host: ScriptHost::new(),
            options,
        }
    }

    /// Runs the full pipeline for the request node with the given id.
    pub fn send(&self, root: &Node, node_id: &str) -> ExecutionOutcome {
        let start = Instant::now();

        let Some(node) = root.find(node_id) else {
            return ExecutionOutcome::aborted(format!("no node with id {}", node_id));
        };
        let Some(config) = node.request_config() else {
            return ExecutionOutcome::aborted(format!("node {} is not a request", node_id));
        };

        // Scope and template resolution.
        let environment = scope::resolve_environment(root, node_id);
        let mut context = crate::template::resolve_map(&environment, &BTreeMap::new());
        let headers = scope::resolve_headers(root, node_id, &context);

        let mut draft = RequestDraft::new(&config.method, &config.url, &config.body, headers);
        let console = ConsoleSink::default();

        // Pre-script: a failure here aborts before any network I/O.
        if let Some(script) = scope::resolve_prescript(root, node_id) {
            log::debug!("running pre-script for {}", node_id);
            match self.script_host.run_pre(script, &context, &draft, &console) {
                Ok((mutated, updated_draft)) => {
                    context.extend(mutated);
                    draft = updated_draft;
                }
                Err(e) => {
                    let mut outcome = ExecutionOutcome::aborted(e.to_string());
                    outcome.method = draft.method.clone();
                    outcome.url = draft.url.clone();
                    outcome.console = console.lines();
                    outcome.duration_ms = start.elapsed().as_millis();
                    self.record_history(&outcome);
                    return outcome;
                }
            }
        }

        // Build the wire request.
        let wire = match builder::build(
            &draft.method,
            &draft.url,
            &draft.body,
            config.body_type,
            &context,
            &draft.headers,
            config.http_version,
            config.timeout_millis,
        ) {
            Ok(wire) => wire,
            Err(e) => {
                let mut outcome = ExecutionOutcome::aborted(e.to_string());
                outcome.phase = SendPhase::Done;
                outcome.method = draft.method.clone();
                outcome.url = draft.url.clone();
                outcome.console = console.lines();
                outcome.duration_ms = start.elapsed().as_millis();
                self.record_history(&outcome);
                return outcome;
            }
        };

        let mut outcome = ExecutionOutcome {
            phase: SendPhase::Sent,
            method: wire.method.to_string(),
            url: wire.url.clone(),
            request_headers: wire.headers.clone(),
            request_body: wire.display_body.clone(),
            response: None,
            pretty_body: None,
            error: None,
            post_script_error: None,
            console: Vec::new(),
            duration_ms: 0,
            download: None,
        };

        match self.transport.execute(&wire) {
            Ok(response) => {
                // Post-script errors are reported but never hide the response.
                let updated_draft = RequestDraft::new(
                    &outcome.method,
                    &outcome.url,
                    &outcome.request_body,
                    outcome.request_headers.clone(),
                );
                if let Some(script) = scope::resolve_postscript(root, node_id) {
                    log::debug!("running post-script for {}", node_id);
                    if let Err(e) = self
                        .script_host
                        .run_post(script, &context, &updated_draft, &response, &console)
                    {
                        outcome.post_script_error = Some(e.to_string());
                    }
                }

                outcome.pretty_body = Some(formatter::pretty_print_body(&response.body_text()));
                if config.download_content {
                    outcome.download = Some(self.handle_download(&response));
                }
                outcome.response = Some(response);
                outcome.phase = SendPhase::Done;
            }
            Err(e) => {
                // The response never arrived, so the post-script is skipped.
                outcome.error = Some(e.to_string());
                outcome.phase = SendPhase::Done;
            }
        }

        outcome.console = console.lines();
        outcome.duration_ms = start.elapsed().as_millis();
        self.record_history(&outcome);
        outcome
    }

    fn handle_download(&self, response: &HttpResponse) -> DownloadOutcome {
        let extension = classifier::classify(&response.body);
        let path = if self.options.auto_open_downloads {
            classifier::download::save_and_open(&response.body, &extension)
        } else {
            None
        };
        DownloadOutcome { extension, path }
    }

    fn record_history(&self, outcome: &ExecutionOutcome) {
        let Some(history) = &self.options.history else {
            return;
        };
        let mut record = ExecutionRecord::new(&outcome.method, &outcome.url);
        record.request_headers = outcome.request_headers.clone();
        record.request_body = outcome.request_body.clone();
        let record = match (&outcome.response, &outcome.error) {
            (Some(response), _) => record.with_response(response),
            (None, Some(error)) => record.with_failure(error),
            (None, None) => record.with_failure("aborted"),
        };
        history.append(&record);
    }
}

//! Append-only execution history.
//!
//! One human-readable delimited text block per send, written to a log file
//! keyed by project identity. The log is for people, not machines; nothing
//! ever parses it back. Write failures are logged and otherwise ignored so
//! history can never break a send.

use crate::models::HttpResponse;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const BLOCK_DELIMITER: &str = "========================================";

/// Outcome half of a record: either a response or a failure message.
#[derive(Debug, Clone)]
pub enum RecordOutcome {
    Response {
        status_code: u16,
        status_text: String,
        headers: BTreeMap<String, String>,
        body: String,
    },
    Failure {
        error: String,
    },
}

/// A single send, ready to be appended to the log.
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub url: String,
    pub request_headers: BTreeMap<String, String>,
    pub request_body: String,
    pub outcome: RecordOutcome,
}

impl ExecutionRecord {
    pub fn new(method: &str, url: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            method: method.to_string(),
            url: url.to_string(),
            request_headers: BTreeMap::new(),
            request_body: String::new(),
            outcome: RecordOutcome::Failure {
                error: "not executed".to_string(),
            },
        }
    }

    pub fn with_response(mut self, response: &HttpResponse) -> Self {
        self.outcome = RecordOutcome::Response {
            status_code: response.status_code,
            status_text: response.status_text.clone(),
            headers: response.headers.clone(),
            body: response.body_text(),
        };
        self
    }

    pub fn with_failure(mut self, error: &str) -> Self {
        self.outcome = RecordOutcome::Failure {
            error: error.to_string(),
        };
        self
    }

    /// Renders the record as a delimited text block.
    pub fn to_log_block(&self) -> String {
        let mut block = String::new();
        block.push_str(BLOCK_DELIMITER);
        block.push('\n');
        block.push_str(&format!(
            "[{}] {} {}\n",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f UTC"),
            self.method,
            self.url
        ));
        block.push_str(&format!("id: {}\n", self.id));

        if !self.request_headers.is_empty() {
            block.push_str("request headers:\n");
            for (name, value) in &self.request_headers {
                block.push_str(&format!("  {}: {}\n", name, value));
            }
        }
        if !self.request_body.is_empty() {
            block.push_str("request body:\n");
            block.push_str(&self.request_body);
            block.push('\n');
        }

        match &self.outcome {
            RecordOutcome::Response {
                status_code,
                status_text,
                headers,
                body,
            } => {
                block.push_str(&format!("response: {} {}\n", status_code, status_text));
                for (name, value) in headers {
                    block.push_str(&format!("  {}: {}\n", name, value));
                }
                if !body.is_empty() {
                    block.push_str("response body:\n");
                    block.push_str(body);
                    block.push('\n');
                }
            }
            RecordOutcome::Failure { error } => {
                block.push_str(&format!("error: {}\n", error));
            }
        }

        block.push_str(BLOCK_DELIMITER);
        block.push('\n');
        block
    }
}

/// Append-only log file for one project.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    /// Log located in `directory`, named after the project identity.
    pub fn for_project(directory: &Path, project_id: &str) -> Self {
        Self {
            path: directory.join(format!("{}.history.log", project_id)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record. Failures are logged and swallowed.
    pub fn append(&self, record: &ExecutionRecord) {
        let result = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(record.to_log_block().as_bytes()));

        if let Err(e) = result {
            log::warn!("could not append history to {}: {}", self.path.display(), e);
        }
    }
}

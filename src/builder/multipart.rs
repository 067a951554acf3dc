//! Multipart/form-data payload assembly.
//!
//! Fields come from the same `key=value` listing as form-encoded bodies. A
//! value prefixed `file:` names a filesystem path whose bytes are embedded as
//! a file part; a missing or non-regular file drops that field with a warning
//! rather than failing the request.

use chrono::Utc;
use rand::Rng;
use std::path::Path;

/// An assembled multipart body.
#[derive(Debug, Clone)]
pub struct MultipartPayload {
    pub bytes: Vec<u8>,
    pub boundary: String,
    /// Number of fields actually embedded (skipped files excluded).
    pub field_count: usize,
}

/// Encodes the parsed field listing into a multipart/form-data body with a
/// freshly generated boundary.
pub fn encode(pairs: &[(String, String)]) -> MultipartPayload {
    let boundary = generate_boundary();
    let mut bytes = Vec::new();
    let mut field_count = 0;

    for (key, value) in pairs {
        if let Some(path) = value.strip_prefix("file:") {
            let path = Path::new(path.trim());
            match std::fs::read(path) {
                Ok(content) if path.is_file() => {
                    let filename = path
                        .file_name()
                        .and_then(|name| name.to_str())
                        .unwrap_or("upload");
                    append_file_part(&mut bytes, &boundary, key, filename, &content);
                    field_count += 1;
                }
                _ => {
                    log::warn!("skipping multipart field {}: {} is not a readable file", key, path.display());
                }
            }
        } else {
            append_text_part(&mut bytes, &boundary, key, value);
            field_count += 1;
        }
    }

    bytes.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    MultipartPayload {
        bytes,
        boundary,
        field_count,
    }
}

fn append_text_part(bytes: &mut Vec<u8>, boundary: &str, name: &str, value: &str) {
    bytes.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            boundary, name, value
        )
        .as_bytes(),
    );
}

fn append_file_part(bytes: &mut Vec<u8>, boundary: &str, name: &str, filename: &str, content: &[u8]) {
    bytes.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            boundary, name, filename
        )
        .as_bytes(),
    );
    bytes.extend_from_slice(content);
    bytes.extend_from_slice(b"\r\n");
}

/// Time-based boundary with a random suffix, unique per request.
fn generate_boundary() -> String {
    let suffix: u32 = rand::thread_rng().gen();
    format!("----FormBoundary{}{:08x}", Utc::now().timestamp_millis(), suffix)
}

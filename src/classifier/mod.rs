//! Download classification.
//!
//! Picks a file extension for a downloaded payload: sniff a MIME type from
//! the bytes, map it through a known-extension table, disambiguate generic
//! zip containers by their internal entry names, and fall back to substring
//! heuristics on the MIME string. An empty extension tells the caller no
//! confident choice exists and the platform's generic open flow should be
//! used instead.

pub mod download;
pub mod sniff;
pub mod zip;

/// Classifies payload bytes to a file extension (with leading dot), or an
/// empty string when nothing matches.
pub fn classify(bytes: &[u8]) -> String {
    let mime = sniff::sniff_mime(bytes);

    if mime == "application/zip" {
        if let Some(extension) = zip::classify_archive(bytes) {
            return extension.to_string();
        }
        return ".zip".to_string();
    }

    if let Some(extension) = extension_for_mime(mime) {
        return extension.to_string();
    }

    heuristic_extension(mime).unwrap_or_default().to_string()
}

/// Direct MIME-to-extension table for unambiguous types.
fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let extension = match mime {
        "application/pdf" => ".pdf",
        "application/json" => ".json",
        "application/xml" | "text/xml" => ".xml",
        "text/html" => ".html",
        "text/plain" => ".txt",
        "text/csv" => ".csv",
        "image/png" => ".png",
        "image/jpeg" => ".jpg",
        "image/gif" => ".gif",
        "image/bmp" => ".bmp",
        "image/webp" => ".webp",
        "image/svg+xml" => ".svg",
        "message/rfc822" => ".eml",
        "application/msword" => ".doc",
        "application/vnd.ms-excel" => ".xls",
        "application/vnd.ms-powerpoint" => ".ppt",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => ".docx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => ".xlsx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation" => ".pptx",
        _ => return None,
    };
    Some(extension)
}

/// Last-resort substring matching on the MIME string.
fn heuristic_extension(mime: &str) -> Option<&'static str> {
    if mime.contains("pdf") {
        Some(".pdf")
    } else if mime.contains("json") {
        Some(".json")
    } else if mime.contains("html") {
        Some(".html")
    } else if mime.contains("xml") {
        Some(".xml")
    } else if mime.contains("zip") {
        Some(".zip")
    } else if mime.contains("text") {
        Some(".txt")
    } else {
        None
    }
}

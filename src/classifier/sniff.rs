//! Content sniffing from leading bytes.
//!
//! Magic-number checks first, then UTF-8 text heuristics. Returns a MIME
//! string; the extension mapping lives in the parent module.

/// Sniffs a MIME type from the payload's leading bytes.
///
/// Binary signatures win over text heuristics; undecodable payloads fall
/// through to `application/octet-stream`.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    if bytes.is_empty() {
        return "application/octet-stream";
    }

    if bytes.starts_with(b"%PDF") {
        return "application/pdf";
    }
    if bytes.starts_with(b"PK") {
        // Any zip container; OOXML disambiguation happens separately.
        return "application/zip";
    }
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return "image/png";
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "image/jpeg";
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return "image/gif";
    }
    if bytes.starts_with(b"BM") && bytes.len() > 14 {
        return "image/bmp";
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return "image/webp";
    }
    // OLE2 compound document (legacy Office).
    if bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]) {
        return "application/msword";
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => sniff_text(text),
        Err(_) => "application/octet-stream",
    }
}

fn sniff_text(text: &str) -> &'static str {
    let trimmed = text.trim_start();

    if (trimmed.starts_with('{') && trimmed.trim_end().ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.trim_end().ends_with(']'))
    {
        return "application/json";
    }
    if trimmed.starts_with("<?xml") {
        return "application/xml";
    }
    let lower = trimmed.get(..trimmed.len().min(256)).unwrap_or("").to_lowercase();
    if lower.starts_with("<!doctype html") || lower.starts_with("<html") {
        return "text/html";
    }
    if looks_like_email(text) {
        return "message/rfc822";
    }
    "text/plain"
}

/// RFC 822 style header block: several leading `Name: value` lines including
/// at least one common mail header.
fn looks_like_email(text: &str) -> bool {
    let mut header_lines = 0;
    let mut has_mail_header = false;
    for line in text.lines().take(20) {
        if line.is_empty() {
            break;
        }
        let Some((name, _)) = line.split_once(':') else {
            // header continuation lines start with whitespace
            if line.starts_with(' ') || line.starts_with('\t') {
                continue;
            }
            return false;
        };
        if name.contains(' ') {
            return false;
        }
        header_lines += 1;
        let lower = name.to_lowercase();
        if matches!(lower.as_str(), "from" | "to" | "subject" | "received" | "return-path" | "message-id") {
            has_mail_header = true;
        }
    }
    header_lines >= 3 && has_mail_header
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_signatures() {
        assert_eq!(sniff_mime(b"%PDF-1.7 rest"), "application/pdf");
        assert_eq!(sniff_mime(b"PK\x03\x04data"), "application/zip");
        assert_eq!(sniff_mime(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]), "image/png");
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(sniff_mime(b"GIF89a..."), "image/gif");
        assert_eq!(sniff_mime(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1]), "application/msword");
    }

    #[test]
    fn test_webp_needs_riff_wrapper() {
        let mut bytes = Vec::from(&b"RIFF"[..]);
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes.extend_from_slice(b"WEBP");
        assert_eq!(sniff_mime(&bytes), "image/webp");
    }

    #[test]
    fn test_json_detection() {
        assert_eq!(sniff_mime(br#"  {"a": 1}"#), "application/json");
        assert_eq!(sniff_mime(b"[1, 2, 3]"), "application/json");
    }

    #[test]
    fn test_xml_and_html_detection() {
        assert_eq!(sniff_mime(b"<?xml version=\"1.0\"?><a/>"), "application/xml");
        assert_eq!(sniff_mime(b"<!DOCTYPE html><html></html>"), "text/html");
        assert_eq!(sniff_mime(b"<html><body/></html>"), "text/html");
    }

    #[test]
    fn test_email_detection() {
        let email = "From: a@example.com\r\nTo: b@example.com\r\nSubject: hi\r\n\r\nbody";
        assert_eq!(sniff_mime(email.as_bytes()), "message/rfc822");
    }

    #[test]
    fn test_plain_text_fallback() {
        assert_eq!(sniff_mime(b"just some words"), "text/plain");
    }

    #[test]
    fn test_undecodable_is_octet_stream() {
        assert_eq!(sniff_mime(&[0x00, 0xFE, 0xFF, 0x01]), "application/octet-stream");
        assert_eq!(sniff_mime(&[]), "application/octet-stream");
    }
}

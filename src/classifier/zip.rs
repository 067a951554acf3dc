//! Zip central-directory inspection.
//!
//! OOXML documents are plain zip archives; telling a `.docx` from a generic
//! `.zip` requires looking inside. Entry names identify the document family
//! (word/, xl/, ppt/) and macro payloads; the template and slideshow variants
//! share the same part names as their base formats and are distinguished by
//! the content types declared in `[Content_Types].xml`. Only the directory
//! records and that single entry are read; the document data itself is never
//! touched.

use flate2::read::DeflateDecoder;
use std::io::Read;

const EOCD_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x05, 0x06];
const CENTRAL_HEADER_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x01, 0x02];
const LOCAL_HEADER_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
const EOCD_MIN_SIZE: usize = 22;

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATED: u16 = 8;

/// One central-directory record.
#[derive(Debug, Clone)]
struct CentralEntry {
    name: String,
    method: u16,
    compressed_size: usize,
    local_offset: usize,
}

/// Lists the entry names recorded in the archive's central directory.
///
/// Returns `None` for payloads that are not well-formed zip archives.
pub fn entry_names(bytes: &[u8]) -> Option<Vec<String>> {
    Some(central_entries(bytes)?.into_iter().map(|e| e.name).collect())
}

fn central_entries(bytes: &[u8]) -> Option<Vec<CentralEntry>> {
    let eocd = find_eocd(bytes)?;

    let entry_count = u16::from_le_bytes([bytes[eocd + 10], bytes[eocd + 11]]) as usize;
    let directory_offset =
        u32::from_le_bytes([bytes[eocd + 16], bytes[eocd + 17], bytes[eocd + 18], bytes[eocd + 19]])
            as usize;

    let mut entries = Vec::with_capacity(entry_count);
    let mut cursor = directory_offset;

    for _ in 0..entry_count {
        if cursor + 46 > bytes.len() || bytes[cursor..cursor + 4] != CENTRAL_HEADER_SIGNATURE {
            return None;
        }
        let method = u16::from_le_bytes([bytes[cursor + 10], bytes[cursor + 11]]);
        let compressed_size = u32::from_le_bytes([
            bytes[cursor + 20],
            bytes[cursor + 21],
            bytes[cursor + 22],
            bytes[cursor + 23],
        ]) as usize;
        let name_len = u16::from_le_bytes([bytes[cursor + 28], bytes[cursor + 29]]) as usize;
        let extra_len = u16::from_le_bytes([bytes[cursor + 30], bytes[cursor + 31]]) as usize;
        let comment_len = u16::from_le_bytes([bytes[cursor + 32], bytes[cursor + 33]]) as usize;
        let local_offset = u32::from_le_bytes([
            bytes[cursor + 42],
            bytes[cursor + 43],
            bytes[cursor + 44],
            bytes[cursor + 45],
        ]) as usize;

        let name_start = cursor + 46;
        let name_end = name_start + name_len;
        if name_end > bytes.len() {
            return None;
        }
        if let Ok(name) = std::str::from_utf8(&bytes[name_start..name_end]) {
            entries.push(CentralEntry {
                name: name.to_string(),
                method,
                compressed_size,
                local_offset,
            });
        }
        cursor = name_end + extra_len + comment_len;
    }

    Some(entries)
}

/// Scans backward for the end-of-central-directory record, tolerating a
/// trailing archive comment.
fn find_eocd(bytes: &[u8]) -> Option<usize> {
    if bytes.len() < EOCD_MIN_SIZE {
        return None;
    }
    let mut position = bytes.len() - EOCD_MIN_SIZE;
    loop {
        if bytes[position..position + 4] == EOCD_SIGNATURE {
            return Some(position);
        }
        if position == 0 {
            return None;
        }
        position -= 1;
    }
}

/// Reads one entry's data through its local file header.
fn entry_data(bytes: &[u8], entry: &CentralEntry) -> Option<Vec<u8>> {
    let header = entry.local_offset;
    if header + 30 > bytes.len() || bytes[header..header + 4] != LOCAL_HEADER_SIGNATURE {
        return None;
    }
    let name_len = u16::from_le_bytes([bytes[header + 26], bytes[header + 27]]) as usize;
    let extra_len = u16::from_le_bytes([bytes[header + 28], bytes[header + 29]]) as usize;

    let data_start = header + 30 + name_len + extra_len;
    let data_end = data_start + entry.compressed_size;
    if data_end > bytes.len() {
        return None;
    }
    let data = &bytes[data_start..data_end];

    match entry.method {
        METHOD_STORED => Some(data.to_vec()),
        METHOD_DEFLATED => {
            let mut inflated = Vec::new();
            DeflateDecoder::new(data).read_to_end(&mut inflated).ok()?;
            Some(inflated)
        }
        _ => None,
    }
}

/// Returns the text of `[Content_Types].xml`, when present and readable.
fn content_types_xml(bytes: &[u8], entries: &[CentralEntry]) -> Option<String> {
    let entry = entries.iter().find(|e| e.name == "[Content_Types].xml")?;
    let data = entry_data(bytes, entry)?;
    Some(String::from_utf8_lossy(&data).into_owned())
}

/// Classifies an OOXML archive by its internal layout.
///
/// Returns the specific extension when a known package structure is found,
/// `None` for a generic archive. Macro-enabled variants are detected by the
/// presence of `vbaProject.bin`; template and slideshow variants by the
/// declared content types.
pub fn classify_archive(bytes: &[u8]) -> Option<&'static str> {
    let entries = central_entries(bytes)?;
    let has = |prefix: &str| entries.iter().any(|e| e.name.starts_with(prefix));
    let has_macro = |dir: &str| {
        entries
            .iter()
            .any(|e| e.name == format!("{}/vbaProject.bin", dir))
    };

    if !has("word/") && !has("xl/") && !has("ppt/") {
        return None;
    }
    let content_types = content_types_xml(bytes, &entries).unwrap_or_default();

    if has("word/") {
        return Some(if has_macro("word") {
            ".docm"
        } else if content_types.contains("wordprocessingml.template") {
            ".dotx"
        } else {
            ".docx"
        });
    }
    if has("xl/") {
        return Some(if has_macro("xl") {
            ".xlsm"
        } else if content_types.contains("spreadsheetml.template") {
            ".xltx"
        } else {
            ".xlsx"
        });
    }
    Some(if has_macro("ppt") {
        ".pptm"
    } else if content_types.contains("presentationml.slideshow") {
        ".ppsx"
    } else if content_types.contains("presentationml.template") {
        ".potx"
    } else {
        ".pptx"
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::write::DeflateEncoder;
    use flate2::Compression;
    use std::io::Write;

    /// Builds a minimal zip archive from (name, method, data) entries.
    pub(crate) fn fake_zip_with(entries: &[(&str, u16, &[u8])]) -> Vec<u8> {
        let mut local = Vec::new();
        let mut central = Vec::new();
        let mut offsets = Vec::new();

        for (name, method, data) in entries {
            offsets.push(local.len() as u32);
            local.extend_from_slice(&LOCAL_HEADER_SIGNATURE);
            local.extend_from_slice(&[0; 4]); // version, flags
            local.extend_from_slice(&method.to_le_bytes());
            local.extend_from_slice(&[0; 8]); // time, date, crc
            local.extend_from_slice(&(data.len() as u32).to_le_bytes());
            local.extend_from_slice(&(data.len() as u32).to_le_bytes());
            local.extend_from_slice(&(name.len() as u16).to_le_bytes());
            local.extend_from_slice(&0u16.to_le_bytes()); // extra len
            local.extend_from_slice(name.as_bytes());
            local.extend_from_slice(data);
        }

        for ((name, method, data), offset) in entries.iter().zip(&offsets) {
            central.extend_from_slice(&CENTRAL_HEADER_SIGNATURE);
            central.extend_from_slice(&[0; 6]); // versions, flags
            central.extend_from_slice(&method.to_le_bytes());
            central.extend_from_slice(&[0; 8]); // time, date, crc
            central.extend_from_slice(&(data.len() as u32).to_le_bytes());
            central.extend_from_slice(&(data.len() as u32).to_le_bytes());
            central.extend_from_slice(&(name.len() as u16).to_le_bytes());
            central.extend_from_slice(&0u16.to_le_bytes()); // extra
            central.extend_from_slice(&0u16.to_le_bytes()); // comment
            central.extend_from_slice(&[0; 8]); // disk, attrs
            central.extend_from_slice(&offset.to_le_bytes());
            central.extend_from_slice(name.as_bytes());
        }

        let mut bytes = local;
        let central_offset = bytes.len() as u32;
        bytes.extend_from_slice(&central);

        bytes.extend_from_slice(&EOCD_SIGNATURE);
        bytes.extend_from_slice(&[0; 4]); // disk numbers
        bytes.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        bytes.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        bytes.extend_from_slice(&(central.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&central_offset.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes()); // comment len
        bytes
    }

    /// Archive of empty stored entries, names only.
    pub(crate) fn fake_zip(names: &[&str]) -> Vec<u8> {
        let entries: Vec<(&str, u16, &[u8])> = names
            .iter()
            .map(|name| (*name, METHOD_STORED, &b""[..]))
            .collect();
        fake_zip_with(&entries)
    }

    fn deflated(text: &str) -> Vec<u8> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    const DOCX_TYPES: &str = r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#;
    const DOTX_TYPES: &str = r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.template.main+xml"/>"#;
    const PPSX_TYPES: &str = r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideshow.main+xml"/>"#;
    const XLTX_TYPES: &str = r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.template.main+xml"/>"#;

    #[test]
    fn test_entry_names_roundtrip() {
        let bytes = fake_zip(&["word/document.xml", "[Content_Types].xml"]);
        let names = entry_names(&bytes).unwrap();
        assert_eq!(names, vec!["word/document.xml", "[Content_Types].xml"]);
    }

    #[test]
    fn test_entry_names_with_comment() {
        let mut bytes = fake_zip(&["a.txt"]);
        // fix up comment length and append a comment
        let len = bytes.len();
        bytes[len - 2..].copy_from_slice(&5u16.to_le_bytes());
        bytes.extend_from_slice(b"hello");
        assert_eq!(entry_names(&bytes).unwrap(), vec!["a.txt"]);
    }

    #[test]
    fn test_not_a_zip() {
        assert!(entry_names(b"PK but nothing else").is_none());
        assert!(entry_names(b"").is_none());
        assert!(classify_archive(b"PK\x03\x04 truncated").is_none());
    }

    #[test]
    fn test_classify_word_document() {
        let bytes = fake_zip_with(&[
            ("[Content_Types].xml", METHOD_STORED, DOCX_TYPES.as_bytes()),
            ("word/document.xml", METHOD_STORED, b""),
        ]);
        assert_eq!(classify_archive(&bytes), Some(".docx"));
    }

    #[test]
    fn test_classify_word_template() {
        let bytes = fake_zip_with(&[
            ("[Content_Types].xml", METHOD_STORED, DOTX_TYPES.as_bytes()),
            ("word/document.xml", METHOD_STORED, b""),
        ]);
        assert_eq!(classify_archive(&bytes), Some(".dotx"));
    }

    #[test]
    fn test_classify_deflated_content_types() {
        let types = deflated(DOTX_TYPES);
        let bytes = fake_zip_with(&[
            ("[Content_Types].xml", METHOD_DEFLATED, &types),
            ("word/document.xml", METHOD_STORED, b""),
        ]);
        assert_eq!(classify_archive(&bytes), Some(".dotx"));
    }

    #[test]
    fn test_classify_macro_enabled() {
        let bytes = fake_zip(&["word/document.xml", "word/vbaProject.bin"]);
        assert_eq!(classify_archive(&bytes), Some(".docm"));

        let bytes = fake_zip(&["xl/workbook.xml", "xl/vbaProject.bin"]);
        assert_eq!(classify_archive(&bytes), Some(".xlsm"));
    }

    #[test]
    fn test_classify_slideshow_and_spreadsheet_template() {
        let bytes = fake_zip_with(&[
            ("[Content_Types].xml", METHOD_STORED, PPSX_TYPES.as_bytes()),
            ("ppt/presentation.xml", METHOD_STORED, b""),
        ]);
        assert_eq!(classify_archive(&bytes), Some(".ppsx"));

        let bytes = fake_zip_with(&[
            ("[Content_Types].xml", METHOD_STORED, XLTX_TYPES.as_bytes()),
            ("xl/workbook.xml", METHOD_STORED, b""),
        ]);
        assert_eq!(classify_archive(&bytes), Some(".xltx"));
    }

    #[test]
    fn test_classify_without_content_types_defaults_to_base_format() {
        let bytes = fake_zip(&["ppt/presentation.xml"]);
        assert_eq!(classify_archive(&bytes), Some(".pptx"));
        let bytes = fake_zip(&["xl/workbook.xml"]);
        assert_eq!(classify_archive(&bytes), Some(".xlsx"));
    }

    #[test]
    fn test_classify_generic_archive() {
        let bytes = fake_zip(&["readme.txt"]);
        assert_eq!(classify_archive(&bytes), None);
    }
}

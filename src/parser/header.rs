//! RFC 5322 header blocks: framing, unfolding and canonical names.

use crate::error::{RenderError, Result};

/// An ordered list of `(canonical name, unfolded value)` pairs.
///
/// Names are stored canonicalised (`content-type` → `Content-Type`); lookups
/// are case-insensitive. Repeated headers keep their document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Parse a raw header block (without the terminating blank line).
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let text = decode_header_bytes(raw);
        let mut entries: Vec<(String, String)> = Vec::new();
        // Set when the previous line was skipped, so its continuations go too
        let mut skipping = false;

        for line in text.lines() {
            if line.starts_with(' ') || line.starts_with('\t') {
                if skipping {
                    continue;
                }
                let Some(last) = entries.last_mut() else {
                    return Err(RenderError::HeaderParse(format!(
                        "continuation line before the first header: {line:?}"
                    )));
                };
                let continued = line.trim();
                if !continued.is_empty() {
                    if !last.1.is_empty() {
                        last.1.push(' ');
                    }
                    last.1.push_str(continued);
                }
                continue;
            }

            if line.is_empty() {
                // Only reachable when the caller passed the blank separator too
                break;
            }

            let Some(colon_pos) = line.find(':') else {
                return Err(RenderError::HeaderParse(format!(
                    "missing ':' in header line {line:?}"
                )));
            };

            let name = &line[..colon_pos];
            if name.is_empty() {
                skipping = true;
                continue;
            }
            if !name.bytes().all(is_field_name_byte) {
                return Err(RenderError::HeaderParse(format!(
                    "invalid header name {name:?}"
                )));
            }

            skipping = false;
            entries.push((canonical_name(name), line[colon_pos + 1..].trim().to_string()));
        }

        Ok(Self { entries })
    }

    /// First value of a header, case-insensitive.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// First value of a header, or `""` when absent.
    pub fn get_or_empty(&self, name: &str) -> &str {
        self.get(name).unwrap_or_default()
    }

    /// All `(name, value)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of header lines (after unfolding).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the block held no headers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split a message or part into its header block and body.
///
/// The header block ends at the first empty line (LF or CRLF). The empty
/// line itself belongs to neither half. Without one, everything is header.
pub fn split_header_block(data: &[u8]) -> (&[u8], &[u8]) {
    if data.starts_with(b"\n") {
        return (&[], &data[1..]);
    }
    if data.starts_with(b"\r\n") {
        return (&[], &data[2..]);
    }

    for i in 0..data.len() {
        if data[i] != b'\n' {
            continue;
        }
        if data.get(i + 1) == Some(&b'\n') {
            return (&data[..=i], &data[i + 2..]);
        }
        if data.get(i + 1) == Some(&b'\r') && data.get(i + 2) == Some(&b'\n') {
            return (&data[..=i], &data[i + 3..]);
        }
    }
    (data, &[])
}

/// Skip a leading UTF-8 BOM and an mbox `From ` envelope line.
pub fn skip_envelope(data: &[u8]) -> &[u8] {
    let data = data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data);

    if data.starts_with(b"From ") {
        if let Some(pos) = data.iter().position(|&b| b == b'\n') {
            return &data[pos + 1..];
        }
    }
    data
}

/// Canonical form of a header name: `x-MAILER` → `X-Mailer`.
pub fn canonical_name(name: &str) -> String {
    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

/// Decode raw header bytes to a string.
///
/// Tries UTF-8 first, then falls back to Windows-1252 (which accepts every byte).
fn decode_header_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes);
            decoded.into_owned()
        }
    }
}

/// Visible ASCII except `:` (RFC 5322 §3.6.8 `ftext`).
fn is_field_name_byte(b: u8) -> bool {
    (b'!'..=b'~').contains(&b) && b != b':'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfold_headers() {
        let raw = b"Subject: This is a long\n\tsubject line\nFrom: user@example.com\n";
        let headers = Headers::parse(raw).unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("subject"), Some("This is a long subject line"));
        assert_eq!(headers.get("FROM"), Some("user@example.com"));
    }

    #[test]
    fn test_canonical_names_and_order() {
        let raw = b"received: by a\r\nRECEIVED: by b\r\ncontent-TYPE: text/plain\r\n";
        let headers = Headers::parse(raw).unwrap();
        let pairs: Vec<_> = headers.iter().collect();
        assert_eq!(
            pairs,
            vec![
                ("Received", "by a"),
                ("Received", "by b"),
                ("Content-Type", "text/plain"),
            ]
        );
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("x-MAILER"), "X-Mailer");
        assert_eq!(canonical_name("message-id"), "Message-Id");
        assert_eq!(canonical_name("MIME-Version"), "Mime-Version");
    }

    #[test]
    fn test_missing_colon_is_an_error() {
        let err = Headers::parse(b"From: a@b.com\nthis is not a header\n").unwrap_err();
        assert!(matches!(err, RenderError::HeaderParse(_)));
    }

    #[test]
    fn test_leading_continuation_is_an_error() {
        let err = Headers::parse(b"  folded\nFrom: a@b.com\n").unwrap_err();
        assert!(matches!(err, RenderError::HeaderParse(_)));
    }

    #[test]
    fn test_space_in_name_is_an_error() {
        let err = Headers::parse(b"Bad Name: value\n").unwrap_err();
        assert!(matches!(err, RenderError::HeaderParse(_)));
    }

    #[test]
    fn test_empty_name_is_skipped() {
        let headers = Headers::parse(b": orphan\n more\nTo: x@y.z\n").unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("to"), Some("x@y.z"));
    }

    #[test]
    fn test_latin1_header_bytes() {
        let headers = Headers::parse(b"Subject: caf\xe9\n").unwrap();
        assert_eq!(headers.get("subject"), Some("café"));
    }

    #[test]
    fn test_latin1_header_bytes_keep_bom_lookalike() {
        let headers = Headers::parse(b"Subject: \xEF\xBB\xBFcaf\xe9\n").unwrap();
        assert_eq!(headers.get("subject"), Some("\u{EF}\u{BB}\u{BF}café"));
    }

    #[test]
    fn test_split_header_block() {
        let (head, body) = split_header_block(b"From: a@b.com\nSubject: Hi\n\nBody\n");
        assert_eq!(head, b"From: a@b.com\nSubject: Hi\n");
        assert_eq!(body, b"Body\n");
    }

    #[test]
    fn test_split_header_block_crlf() {
        let (head, body) = split_header_block(b"From: a@b.com\r\nSubject: Hi\r\n\r\nBody\r\n");
        assert_eq!(head, b"From: a@b.com\r\nSubject: Hi\r\n");
        assert_eq!(body, b"Body\r\n");
    }

    #[test]
    fn test_split_header_block_without_headers() {
        let (head, body) = split_header_block(b"\r\nBody only");
        assert!(head.is_empty());
        assert_eq!(body, b"Body only");
    }

    #[test]
    fn test_split_header_block_without_body() {
        let (head, body) = split_header_block(b"From: a@b.com\n");
        assert_eq!(head, b"From: a@b.com\n");
        assert!(body.is_empty());
    }

    #[test]
    fn test_skip_envelope() {
        let data = b"From user@example.com Thu Jan 01 00:00:00 2024\nSubject: Test\n\nBody\n";
        assert!(skip_envelope(data).starts_with(b"Subject:"));

        let data = b"\xEF\xBB\xBFSubject: Test\n\nBody\n";
        assert!(skip_envelope(data).starts_with(b"Subject:"));

        let data = b"Subject: Test\n\nBody\n";
        assert_eq!(skip_envelope(data), data);
    }
}

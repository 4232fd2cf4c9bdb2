//! `Content-Transfer-Encoding` reversal: quoted-printable, base64, identity.

use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

use crate::error::{RenderError, Result};
use crate::parser::rfc2047::hex_value;

/// Standard alphabet with mandatory padding; non-zero trailing bits are tolerated.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Transfer encodings this pipeline reverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// RFC 2045 §6.7.
    QuotedPrintable,
    /// RFC 2045 §6.8.
    Base64,
    /// `7bit`, `8bit`, `binary`, anything unknown, or no header at all.
    Identity,
}

impl TransferEncoding {
    /// Classify a `Content-Transfer-Encoding` header value.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("quoted-printable") => Self::QuotedPrintable,
            Some("base64") => Self::Base64,
            _ => Self::Identity,
        }
    }

    /// Reverse this encoding on `body`.
    pub fn decode(self, body: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::QuotedPrintable => decode_quoted_printable(body),
            Self::Base64 => decode_base64(body),
            Self::Identity => Ok(body.to_vec()),
        }
    }
}

/// Decode quoted-printable data (RFC 2045 §6.7).
///
/// Trailing whitespace on each line is discarded, `=` at the end of a line
/// joins it with the next, and hard line breaks keep their LF or CRLF form.
/// An `=` that does not start a valid escape is kept as-is.
fn decode_quoted_printable(input: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len());

    for line in input.split_inclusive(|&b| b == b'\n') {
        let trimmed = trim_line_end(line);

        let (content, line_break): (&[u8], &[u8]) = match trimmed.strip_suffix(b"=") {
            Some(soft) => (soft, b""),
            None if line.ends_with(b"\r\n") => (trimmed, b"\r\n"),
            None if line.ends_with(b"\n") => (trimmed, b"\n"),
            None => (trimmed, b""),
        };

        let mut i = 0;
        while i < content.len() {
            match content[i] {
                b'=' => {
                    let escaped = content
                        .get(i + 1)
                        .and_then(|&h| hex_value(h))
                        .zip(content.get(i + 2).and_then(|&l| hex_value(l)));
                    match escaped {
                        Some((hi, lo)) => {
                            out.push((hi << 4) | lo);
                            i += 3;
                            continue;
                        }
                        None => out.push(b'='),
                    }
                }
                b @ (b'\t' | b'\r' | b'\n' | b' '..=b'~') => out.push(b),
                b if b >= 0x80 => out.push(b),
                b => {
                    return Err(RenderError::TransferDecode {
                        encoding: "quoted-printable",
                        reason: format!("invalid unescaped byte 0x{b:02x} in body"),
                    });
                }
            }
            i += 1;
        }

        out.extend_from_slice(line_break);
    }

    Ok(out)
}

/// Decode base64 data. Line breaks are ignored; any other deviation from
/// the standard padded alphabet is an error.
fn decode_base64(input: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = input
        .iter()
        .copied()
        .filter(|&b| b != b'\r' && b != b'\n')
        .collect();

    BASE64
        .decode(&cleaned)
        .map_err(|e| RenderError::TransferDecode {
            encoding: "base64",
            reason: e.to_string(),
        })
}

/// Strip trailing SP, HT, CR and LF.
fn trim_line_end(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|&b| !matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
        .map_or(0, |p| p + 1);
    &line[..end]
}

//! Recursive multipart descent (RFC 2046 §5.1).
//!
//! The walker splits a container on its boundary, decodes each part and
//! files it into the [`MessageRecord`]: first text body, first HTML body,
//! nested containers recursively, everything else as an attachment. The first
//! error aborts the whole walk.

use std::borrow::Cow;

use tracing::{debug, warn};

use crate::error::{RenderError, Result};
use crate::model::attachment::Attachment;
use crate::model::message::MessageRecord;
use crate::parser::classify::{self, PartKind};
use crate::parser::header::{split_header_block, Headers};
use crate::parser::media_type::MediaType;
use crate::parser::transfer::TransferEncoding;

/// Fills a [`MessageRecord`] from a MIME tree.
pub struct MultipartWalker<'a> {
    record: &'a mut MessageRecord,
    max_depth: usize,
}

impl<'a> MultipartWalker<'a> {
    /// Walk into `record`, allowing `max_depth` levels of nested containers
    /// below the top-level one.
    pub fn new(record: &'a mut MessageRecord, max_depth: usize) -> Self {
        Self { record, max_depth }
    }

    /// Split `body` on `boundary` and add every part in document order.
    ///
    /// `depth` is 0 for the top-level container.
    pub fn walk(&mut self, boundary: &str, body: &[u8], depth: usize) -> Result<()> {
        if depth > self.max_depth {
            return Err(RenderError::NestingTooDeep(self.max_depth));
        }

        for part in split_parts(body, boundary)? {
            let (head, part_body) = split_header_block(part);
            let headers = Headers::parse(head)?;
            self.add_content(&headers, part_body, depth)?;
        }
        Ok(())
    }

    /// Decode one part and file it into the record.
    pub fn add_content(&mut self, headers: &Headers, body: &[u8], depth: usize) -> Result<()> {
        let encoding = TransferEncoding::from_header(headers.get("Content-Transfer-Encoding"));

        let data: Cow<'_, [u8]> = if encoding == TransferEncoding::QuotedPrintable {
            Cow::Owned(encoding.decode(body)?)
        } else {
            Cow::Borrowed(body)
        };

        let media_type = MediaType::parse(headers.get_or_empty("Content-Type"))?;
        let disposition = headers.get_or_empty("Content-Disposition");

        let kind = classify::classify(&media_type, disposition)?;
        debug!(
            content_type = %media_type.essence,
            ?encoding,
            depth,
            size = data.len(),
            "Dispatching part"
        );

        match kind {
            PartKind::PlainText => {
                if self.record.text.is_none() {
                    let text = decode_text_body(&data, media_type.charset());
                    if !text.is_empty() {
                        self.record.text = Some(text.replace('\n', "<br>\n"));
                    }
                } else {
                    warn!(content_type = %media_type.essence, "Dropping additional text body");
                }
            }
            PartKind::Html => {
                if self.record.html.is_none() {
                    self.record.html = Some(Attachment::html_body(data.into_owned()));
                } else {
                    warn!(content_type = %media_type.essence, "Dropping additional HTML body");
                }
            }
            PartKind::Multipart { boundary } => {
                self.walk(&boundary, &data, depth + 1)?;
            }
            PartKind::Attachment { filename } => {
                let data = if encoding == TransferEncoding::Base64 {
                    encoding.decode(&data)?
                } else {
                    data.into_owned()
                };
                debug!(filename = %filename, size = data.len(), "Extracted attachment");
                self.record.attachments.push(Attachment::new(data, filename));
            }
        }

        Ok(())
    }
}

/// Split a multipart body into its raw parts (headers + body each).
///
/// The preamble before the first delimiter and the epilogue after the
/// closing one are discarded. The line break in front of a delimiter belongs
/// to the delimiter, not to the preceding part.
pub fn split_parts<'b>(body: &'b [u8], boundary: &str) -> Result<Vec<&'b [u8]>> {
    let dash_boundary = format!("--{boundary}");
    let mut parts = Vec::new();
    let mut part_start: Option<usize> = None;
    let mut offset = 0;

    for line in body.split_inclusive(|&b| b == b'\n') {
        let line_start = offset;
        offset += line.len();

        let Some(closing) = delimiter(line, dash_boundary.as_bytes()) else {
            continue;
        };

        if let Some(start) = part_start {
            parts.push(strip_line_break(&body[start..line_start]));
        }
        if closing {
            return Ok(parts);
        }
        part_start = Some(offset);
    }

    Err(RenderError::Multipart(format!(
        "missing closing delimiter \"{dash_boundary}--\""
    )))
}

/// `Some(false)` for `--boundary`, `Some(true)` for `--boundary--`,
/// `None` for any other line. Trailing whitespace is allowed.
fn delimiter(line: &[u8], dash_boundary: &[u8]) -> Option<bool> {
    let rest = line.strip_prefix(dash_boundary)?;
    let end = rest
        .iter()
        .rposition(|&b| !matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
        .map_or(0, |p| p + 1);

    match &rest[..end] {
        b"" => Some(false),
        b"--" => Some(true),
        _ => None,
    }
}

fn strip_line_break(part: &[u8]) -> &[u8] {
    part.strip_suffix(b"\r\n")
        .or_else(|| part.strip_suffix(b"\n"))
        .unwrap_or(part)
}

/// Decode a text body with its declared charset (UTF-8 when absent).
///
/// A leading byte order mark is content, not a charset override.
fn decode_text_body(data: &[u8], charset: Option<&str>) -> String {
    let Some(label) = charset.map(str::trim).filter(|c| !c.is_empty()) else {
        return String::from_utf8_lossy(data).into_owned();
    };

    match encoding_rs::Encoding::for_label(label.as_bytes()) {
        Some(encoding) => {
            let (decoded, _) = encoding.decode_without_bom_handling(data);
            decoded.into_owned()
        }
        None => {
            warn!(charset = label, "Unknown body charset, falling back to UTF-8 lossy");
            String::from_utf8_lossy(data).into_owned()
        }
    }
}

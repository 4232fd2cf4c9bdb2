//! Entry point for a single RFC 5322 message: headers in, [`MessageRecord`] out.

use std::io::Read;

use tracing::{debug, info};

use crate::config::DecoderConfig;
use crate::error::{RenderError, Result};
use crate::model::message::{HeaderMap, MessageRecord};
use crate::parser::classify;
use crate::parser::header::{skip_envelope, split_header_block, Headers};
use crate::parser::media_type::MediaType;
use crate::parser::multipart::MultipartWalker;
use crate::parser::rfc2047::HeaderDecoder;

/// Read one message from `reader` and decode it.
pub fn read_message(mut reader: impl Read, config: &DecoderConfig) -> Result<MessageRecord> {
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw)?;
    parse_message(&raw, config)
}

/// Decode a complete raw message (headers + body).
///
/// A leading BOM or mbox `From ` line is skipped. Any failure aborts the
/// conversion; no partial record is returned.
pub fn parse_message(raw: &[u8], config: &DecoderConfig) -> Result<MessageRecord> {
    let data = skip_envelope(raw);
    if data.is_empty() {
        return Err(RenderError::HeaderParse("empty message".to_string()));
    }

    let (head, body) = split_header_block(data);
    let headers = Headers::parse(head)?;

    let media_type = MediaType::parse(headers.get_or_empty("Content-Type"))?;

    let decoder = HeaderDecoder::new(config.charsets);
    let mut record = MessageRecord {
        date: headers.get_or_empty("Date").to_string(),
        from: decoder.decode(headers.get_or_empty("From"))?,
        to: decoder.decode(headers.get_or_empty("To"))?,
        subject: decoder.decode(headers.get_or_empty("Subject"))?,
        headers: decode_all_headers(&headers, &decoder)?,
        ..MessageRecord::default()
    };

    debug!(
        content_type = %media_type.essence,
        headers = headers.len(),
        body_size = body.len(),
        "Parsed top-level headers"
    );

    let mut walker = MultipartWalker::new(&mut record, config.max_depth);
    if classify::is_multipart(&media_type.essence) {
        let boundary = classify::multipart_boundary(&media_type)?;
        walker.walk(boundary, body, 0)?;
    } else {
        walker.add_content(&headers, body, 0)?;
    }

    info!(
        subject = %record.subject,
        has_text = record.text.is_some(),
        has_html = record.html.is_some(),
        attachments = record.attachments.len(),
        "Decoded message"
    );

    Ok(record)
}

/// RFC 2047-decode every header value, grouping repeated names in order.
fn decode_all_headers(headers: &Headers, decoder: &HeaderDecoder) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers.iter() {
        map.entry(name.to_string())
            .or_default()
            .push(decoder.decode(value)?);
    }
    Ok(map)
}

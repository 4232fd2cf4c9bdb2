//! The rendered representation of one message.

use std::collections::BTreeMap;

use super::attachment::Attachment;

/// Decoded headers keyed by canonical name (`Content-Type`, `X-Mailer`, …).
///
/// Repeated headers keep every value in document order. Names iterate in
/// sorted order so the rendered output is deterministic.
pub type HeaderMap = BTreeMap<String, Vec<String>>;

/// Everything extracted from a single raw message.
///
/// Built once by [`crate::parser::eml::parse_message`] and handed to the
/// export layer untouched. At most one HTML body and one text body are kept:
/// the first of each found anywhere in the MIME tree.
#[derive(Debug, Clone, Default)]
pub struct MessageRecord {
    /// Raw `Date:` header, not parsed.
    pub date: String,

    /// Decoded `From:` header.
    pub from: String,

    /// Decoded `To:` header.
    pub to: String,

    /// Decoded `Subject:` header.
    pub subject: String,

    /// Every header, RFC 2047-decoded.
    pub headers: HeaderMap,

    /// First `text/html` part, stored as `email-content.html`.
    pub html: Option<Attachment>,

    /// First non-empty `text/plain` part, with `<br>` before every newline.
    /// `None` when no such part exists.
    pub text: Option<String>,

    /// Remaining parts in depth-first document order.
    pub attachments: Vec<Attachment>,
}

impl MessageRecord {
    /// Total decoded size of the HTML body and all attachments.
    pub fn payload_size(&self) -> u64 {
        self.html
            .iter()
            .chain(self.attachments.iter())
            .map(|a| a.size() as u64)
            .sum()
    }
}

//! Leaf-part classification and attachment filename resolution.

use crate::error::{RenderError, Result};
use crate::parser::media_type::MediaType;

/// What a body part turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartKind {
    /// `text/plain*`: candidate for the text body.
    PlainText,
    /// `text/html*`: candidate for the HTML body.
    Html,
    /// `multipart/*`: a container to walk with its boundary.
    Multipart { boundary: String },
    /// Anything else, stored under the resolved filename.
    Attachment { filename: String },
}

/// Classify a part from its media type and raw `Content-Disposition` value.
///
/// Fails for multipart types without a boundary and for attachments whose
/// name can neither be read from the disposition nor derived from the type.
pub fn classify(media_type: &MediaType, disposition: &str) -> Result<PartKind> {
    let essence = media_type.essence.as_str();

    if is_plain_text(essence) {
        return Ok(PartKind::PlainText);
    }
    if is_html(essence) {
        return Ok(PartKind::Html);
    }
    if is_multipart(essence) {
        return Ok(PartKind::Multipart {
            boundary: multipart_boundary(media_type)?.to_string(),
        });
    }

    Ok(PartKind::Attachment {
        filename: attachment_filename(essence, disposition)?,
    })
}

/// The non-empty `boundary` parameter a multipart type must carry.
pub fn multipart_boundary(media_type: &MediaType) -> Result<&str> {
    media_type
        .boundary()
        .filter(|b| !b.is_empty())
        .ok_or_else(|| {
            RenderError::Multipart(format!(
                "{} without a boundary parameter",
                media_type.essence
            ))
        })
}

/// Resolve an attachment's filename, falling back to a per-type default.
pub fn attachment_filename(essence: &str, disposition: &str) -> Result<String> {
    if let Some(name) = filename_from_disposition(disposition) {
        return Ok(name);
    }

    default_filename(essence)
        .map(str::to_string)
        .ok_or_else(|| RenderError::UnknownAttachmentType(essence.to_string()))
}

/// Read the filename out of a `Content-Disposition` value.
///
/// Only the parameter directly after the disposition type is considered:
/// `attachment; filename="report.pdf"` yields `report.pdf`, while
/// `attachment; size=10; filename=a.pdf` yields `10`. Parameter names are
/// not checked and RFC 2231 encodings are not decoded.
pub fn filename_from_disposition(disposition: &str) -> Option<String> {
    let param = disposition.split(';').nth(1)?;
    let value = param.split('=').nth(1)?;
    let name = value.trim_matches('"');
    (!name.is_empty()).then(|| name.to_string())
}

/// Default filename for types that have a natural extension.
pub fn default_filename(essence: &str) -> Option<&'static str> {
    if is_plain_text(essence) {
        Some("attachment.txt")
    } else if is_html(essence) {
        Some("attachment.html")
    } else {
        None
    }
}

pub fn is_plain_text(essence: &str) -> bool {
    essence.starts_with("text/plain")
}

pub fn is_html(essence: &str) -> bool {
    essence.starts_with("text/html")
}

pub fn is_multipart(essence: &str) -> bool {
    essence.starts_with("multipart/")
}

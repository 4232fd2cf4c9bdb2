//! Extracted body parts.
//!
//! An attachment owns its decoded bytes and the name it will be persisted
//! under. Once built it is never modified.

/// Filename under which the HTML body is stored and referenced.
pub const HTML_BODY_FILENAME: &str = "email-content.html";

/// One decoded body part materialised as a standalone file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    data: Vec<u8>,
    filename: String,
}

impl Attachment {
    /// Wrap decoded bytes under the given filename.
    pub fn new(data: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            data,
            filename: filename.into(),
        }
    }

    /// Wrap an HTML body under the fixed [`HTML_BODY_FILENAME`].
    pub fn html_body(data: Vec<u8>) -> Self {
        Self::new(data, HTML_BODY_FILENAME)
    }

    /// The decoded bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The resolved filename, used verbatim as a relative output path.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Decoded size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

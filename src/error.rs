//! Centralized error types for mailrender.
//!
//! Every failure aborts the whole conversion: there is no partial record.
//! The only tolerated defect is a malformed RFC 2047 encoded-word, which the
//! header decoder passes through verbatim without producing an error.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the mailrender library.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The top-level header block or a part's header block is malformed.
    #[error("Malformed header block: {0}")]
    HeaderParse(String),

    /// A `Content-Type` value is not valid media-type syntax.
    #[error("Invalid media type '{value}': {reason}")]
    MediaTypeParse { value: String, reason: String },

    /// An encoded-word references a charset the header decoder cannot decode.
    #[error("Charset not supported: {0}")]
    UnsupportedCharset(String),

    /// A quoted-printable or base64 payload could not be decoded.
    #[error("Invalid {encoding} payload: {reason}")]
    TransferDecode {
        encoding: &'static str,
        reason: String,
    },

    /// An attachment has no filename and its media type has no default extension.
    #[error("Don't know how to generate a filename for {0}")]
    UnknownAttachmentType(String),

    /// A multipart body cannot be split into parts.
    #[error("Malformed multipart body: {0}")]
    Multipart(String),

    /// Multipart containers are nested deeper than the configured limit.
    #[error("Multipart nesting exceeds the limit of {0} levels")]
    NestingTooDeep(usize),

    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias for `Result<T, RenderError>`.
pub type Result<T> = std::result::Result<T, RenderError>;

impl RenderError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a `MediaTypeParse` variant for the offending header value.
    pub(crate) fn media_type(value: &str, reason: impl Into<String>) -> Self {
        Self::MediaTypeParse {
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (reading stdin, for instance).
impl From<std::io::Error> for RenderError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<stdin>"),
            source,
        }
    }
}

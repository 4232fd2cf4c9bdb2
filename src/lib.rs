//! `mailrender` turns one raw email message into a browsable directory.
//!
//! The library decodes RFC 5322 headers (including RFC 2047 encoded-words),
//! walks the MIME tree, undoes quoted-printable and base64 transfer
//! encodings, and collects the result in a
//! [`MessageRecord`](model::message::MessageRecord). The `export` module
//! renders that record as `email.html` plus its body and attachment files.

pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod parser;

//! MIME decoding: header blocks, encoded-words, media types, transfer
//! encodings, part classification and the recursive multipart walk.

pub mod classify;
pub mod eml;
pub mod header;
pub mod media_type;
pub mod multipart;
pub mod rfc2047;
pub mod transfer;

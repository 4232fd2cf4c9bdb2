//! Core data model: the rendered message record and its attachments.

pub mod attachment;
pub mod message;

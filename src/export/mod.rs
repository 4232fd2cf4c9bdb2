//! Output side: the `email.html` index page and the on-disk layout.

pub mod html;
pub mod writer;

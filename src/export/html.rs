//! Render a [`MessageRecord`] as the `email.html` index page.

use std::fmt::Write as _;

use crate::model::attachment::HTML_BODY_FILENAME;
use crate::model::message::MessageRecord;

/// Filename of the generated index page.
pub const INDEX_FILENAME: &str = "email.html";

/// Line break marker inserted into the text body by the decoder.
const TEXT_LINE_BREAK: &str = "<br>\n";

/// Render the index page.
///
/// `attachment_names` holds the name each attachment is stored under, in
/// the same order as `record.attachments`; links point at those names.
pub fn render_index(record: &MessageRecord, attachment_names: &[String]) -> String {
    let mut page = String::with_capacity(4096);

    page.push_str("<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(page, "<title>{}</title>", escape_html(&record.subject));
    page.push_str(
        "<script>\n\
         function toggleHeaders() {\n\
         \tvar e = document.getElementById(\"headers-all\");\n\
         \te.style.display = (e.style.display == 'none') ? 'block' : 'none';\n\
         }\n\
         </script>\n",
    );
    page.push_str("</head>\n<body>\n");

    // Summary
    page.push_str("<div>\n");
    for (label, value) in [
        ("Date", &record.date),
        ("From", &record.from),
        ("To", &record.to),
        ("Subject", &record.subject),
    ] {
        let _ = writeln!(page, "{label}: {}<br>", escape_html(value));
    }
    page.push_str("</div>\n\n");

    // All headers, collapsed by default
    page.push_str("<a onclick=\"toggleHeaders()\" href=\"#\">Toggle all headers</a><br><br>\n");
    page.push_str("<div id=\"headers-all\" style=\"display: none\">\n");
    for (name, values) in &record.headers {
        for value in values {
            let _ = writeln!(page, "{}: {}<br>", escape_html(name), escape_html(value));
        }
    }
    page.push_str("</div>\n");

    if record.html.is_some() {
        let _ = write!(
            page,
            "<div>\n<hr>\n<div class=\"html-content\">\
             <iframe width=\"1280\" height=\"720\" src=\"{}\"></iframe></div>\n</div>\n",
            encode_href(HTML_BODY_FILENAME)
        );
    }

    if let Some(text) = &record.text {
        let _ = write!(
            page,
            "<div>\n<hr>\n<div class=\"text-content\">{}</div>\n</div>\n",
            render_text(text)
        );
    }

    if !attachment_names.is_empty() {
        page.push_str("<div>\n<hr>\nAttachments:<br><br>\n");
        for name in attachment_names {
            let _ = writeln!(
                page,
                "<a href=\"{}\">{}</a><br>",
                encode_href(name),
                escape_html(name)
            );
        }
        page.push_str("</div>\n");
    }

    page.push_str("</body>\n</html>\n");
    page
}

/// Escape the text body while keeping the decoder's `<br>` line breaks.
fn render_text(text: &str) -> String {
    text.split(TEXT_LINE_BREAK)
        .map(escape_html)
        .collect::<Vec<_>>()
        .join(TEXT_LINE_BREAK)
}

/// Escape `&`, `<`, `>`, `"` and `'` for element and attribute content.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Percent-encode a relative filename for use in `href`/`src`.
///
/// Unreserved characters (RFC 3986 §2.3) pass through; everything else,
/// including `/`, `?` and `#`, is encoded so the link always names a file
/// in the same directory.
pub fn encode_href(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for b in name.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(char::from(b));
        } else {
            let _ = write!(out, "%{b:02X}");
        }
    }
    out
}

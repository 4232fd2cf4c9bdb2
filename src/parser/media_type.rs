//! `Content-Type` parsing (RFC 2045 §5.1).
//!
//! Format: `type/subtype; param1=value1; param2="quoted value"`

use std::collections::BTreeMap;

use crate::error::{RenderError, Result};

/// A parsed media type with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    /// Lower-cased `type/subtype`.
    pub essence: String,
    /// Parameters keyed by lower-cased name, values unquoted.
    pub params: BTreeMap<String, String>,
}

impl MediaType {
    /// Parse a `Content-Type` header value.
    ///
    /// An empty value (including a missing header) is an error.
    pub fn parse(value: &str) -> Result<Self> {
        let (base, mut rest) = match value.find(';') {
            Some(pos) => (&value[..pos], &value[pos..]),
            None => (value, ""),
        };

        let essence = base.trim().to_ascii_lowercase();
        check_essence(&essence).map_err(|reason| RenderError::media_type(value, reason))?;

        let mut params = BTreeMap::new();
        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }

            let Some((name, param_value, tail)) = consume_param(rest) else {
                if rest.trim() == ";" {
                    // Trailing semicolon
                    break;
                }
                return Err(RenderError::media_type(value, "invalid parameter"));
            };

            if params.insert(name.clone(), param_value).is_some() {
                return Err(RenderError::media_type(
                    value,
                    format!("duplicate parameter '{name}'"),
                ));
            }
            rest = tail;
        }

        Ok(Self { essence, params })
    }

    /// Value of a parameter by (lower-case) name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// The `boundary` parameter of a multipart type.
    pub fn boundary(&self) -> Option<&str> {
        self.param("boundary")
    }

    /// The `charset` parameter of a text type.
    pub fn charset(&self) -> Option<&str> {
        self.param("charset")
    }
}

/// Validate `type[/subtype]`, returning the reason on failure.
fn check_essence(essence: &str) -> std::result::Result<(), &'static str> {
    let (main, rest) = consume_token(essence);
    if main.is_empty() {
        return Err("no media type");
    }
    if rest.is_empty() {
        return Ok(());
    }
    let Some(rest) = rest.strip_prefix('/') else {
        return Err("expected slash after first token");
    };
    let (sub, rest) = consume_token(rest);
    if sub.is_empty() {
        return Err("expected token after slash");
    }
    if !rest.is_empty() {
        return Err("unexpected content after media subtype");
    }
    Ok(())
}

/// Consume `; name=value` from the front of `s`.
///
/// Returns the lower-cased name, the unquoted value, and the unconsumed tail.
fn consume_param(s: &str) -> Option<(String, String, &str)> {
    let rest = s.trim_start().strip_prefix(';')?.trim_start();

    let (name, rest) = consume_token(rest);
    if name.is_empty() {
        return None;
    }

    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let (value, tail) = consume_value(rest)?;

    Some((name.to_ascii_lowercase(), value, tail))
}

/// A token or a quoted-string.
fn consume_value(s: &str) -> Option<(String, &str)> {
    let Some(quoted) = s.strip_prefix('"') else {
        let (token, rest) = consume_token(s);
        return (!token.is_empty()).then(|| (token.to_string(), rest));
    };

    let mut value = String::new();
    let mut chars = quoted.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((value, &quoted[i + 1..])),
            '\\' => {
                let next = quoted[i + 1..].chars().next();
                match next {
                    Some(n) if is_tspecial(n) => {
                        value.push(n);
                        chars.next();
                    }
                    _ => value.push('\\'),
                }
            }
            '\r' | '\n' => return None,
            _ => value.push(c),
        }
    }
    // Unterminated quoted-string
    None
}

fn consume_token(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !is_token_char(c)).unwrap_or(s.len());
    (&s[..end], &s[end..])
}

fn is_token_char(c: char) -> bool {
    c.is_ascii() && c > ' ' && c != '\x7f' && !is_tspecial(c)
}

fn is_tspecial(c: char) -> bool {
    matches!(
        c,
        '(' | ')' | '<' | '>' | '@' | ',' | ';' | ':' | '\\' | '"' | '/' | '[' | ']' | '?' | '='
    )
}

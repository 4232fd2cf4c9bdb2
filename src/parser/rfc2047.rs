//! RFC 2047 encoded-word decoding for header values.
//!
//! Example: `"=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?="` → `"Hola mundo"`
//!
//! Two failure classes are kept apart. A word that is syntactically broken or
//! whose payload does not decode is left verbatim and decoding carries on. A
//! well-formed word naming a charset outside the decoder's [`CharsetPolicy`]
//! fails the whole value with [`RenderError::UnsupportedCharset`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};

/// Which charsets an encoded-word may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharsetPolicy {
    /// UTF-8, US-ASCII and ISO-8859-1 only.
    Basic,
    /// Any WHATWG encoding label known to `encoding_rs`.
    #[default]
    Extended,
}

impl CharsetPolicy {
    /// Convert `bytes` from `charset` to a string, or `None` if the charset
    /// is not accepted under this policy.
    fn decode(self, charset: &str, bytes: &[u8]) -> Option<String> {
        if charset.eq_ignore_ascii_case("utf-8") {
            return Some(String::from_utf8_lossy(bytes).into_owned());
        }

        match self {
            Self::Basic => {
                if charset.eq_ignore_ascii_case("iso-8859-1") {
                    Some(bytes.iter().map(|&b| char::from(b)).collect())
                } else if charset.eq_ignore_ascii_case("us-ascii") {
                    Some(
                        bytes
                            .iter()
                            .map(|&b| {
                                if b.is_ascii() {
                                    char::from(b)
                                } else {
                                    char::REPLACEMENT_CHARACTER
                                }
                            })
                            .collect(),
                    )
                } else {
                    None
                }
            }
            Self::Extended => {
                let encoding = encoding_rs::Encoding::for_label(charset.trim().as_bytes())?;
                let (decoded, _) = encoding.decode_without_bom_handling(bytes);
                Some(decoded.into_owned())
            }
        }
    }
}

/// Decodes encoded-words in header values under a fixed charset policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderDecoder {
    charsets: CharsetPolicy,
}

impl HeaderDecoder {
    /// Create a decoder accepting the charsets allowed by `charsets`.
    pub fn new(charsets: CharsetPolicy) -> Self {
        Self { charsets }
    }

    /// Decode every encoded-word in `input`.
    ///
    /// Whitespace separating two adjacent encoded-words is dropped
    /// (RFC 2047 §6.2). Malformed words are kept as they are.
    pub fn decode(&self, input: &str) -> Result<String> {
        let Some(first) = input.find("=?") else {
            return Ok(input.to_string());
        };

        let mut result = String::with_capacity(input.len());
        result.push_str(&input[..first]);
        let mut remaining = &input[first..];
        let mut between_words = false;

        while let Some(start) = remaining.find("=?") {
            let Some(word) = split_encoded_word(&remaining[start + 2..]) else {
                break;
            };

            let Some(bytes) = decode_payload(word.encoding, word.text) else {
                // Not a valid word: emit the "=?" and keep scanning after it
                between_words = false;
                result.push_str(&remaining[..start + 2]);
                remaining = &remaining[start + 2..];
                continue;
            };

            let before = &remaining[..start];
            if !between_words || !before.chars().all(char::is_whitespace) {
                result.push_str(before);
            }

            let text = self
                .charsets
                .decode(word.charset, &bytes)
                .ok_or_else(|| RenderError::UnsupportedCharset(word.charset.to_string()))?;
            result.push_str(&text);

            remaining = &remaining[start + 2 + word.consumed..];
            between_words = true;
        }

        result.push_str(remaining);
        Ok(result)
    }
}

/// The pieces of one `charset?encoding?text?=` word.
struct EncodedWord<'a> {
    charset: &'a str,
    encoding: u8,
    text: &'a str,
    /// Bytes consumed from the string *after* the initial `"=?"`.
    consumed: usize,
}

fn split_encoded_word(s: &str) -> Option<EncodedWord<'_>> {
    let first_q = s.find('?')?;
    let charset = &s[..first_q];

    let cur = first_q + 1;
    // Shortest possible tail is "Q??="
    if s.len() < cur + 4 {
        return None;
    }
    let bytes = s.as_bytes();
    let encoding = bytes[cur];
    if bytes[cur + 1] != b'?' {
        return None;
    }

    let rest = &s[cur + 2..];
    let end = rest.find("?=")?;

    Some(EncodedWord {
        charset,
        encoding,
        text: &rest[..end],
        consumed: cur + 2 + end + 2,
    })
}

fn decode_payload(encoding: u8, text: &str) -> Option<Vec<u8>> {
    match encoding {
        b'B' | b'b' => STANDARD.decode(text).ok(),
        b'Q' | b'q' => decode_q_encoding(text),
        _ => None,
    }
}

/// Decode Q-encoding (RFC 2047 §4.2): underscores → spaces, `=XX` → byte.
fn decode_q_encoding(input: &str) -> Option<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => result.push(b' '),
            b'=' => {
                let hi = hex_value(*bytes.get(i + 1)?)?;
                let lo = hex_value(*bytes.get(i + 2)?)?;
                result.push((hi << 4) | lo);
                i += 2;
            }
            b @ (b' '..=b'~' | b'\t' | b'\r' | b'\n') => result.push(b),
            _ => return None,
        }
        i += 1;
    }
    Some(result)
}

/// Value of one hex digit, either case.
pub(crate) fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(input: &str) -> Result<String> {
        HeaderDecoder::default().decode(input)
    }

    #[test]
    fn test_decode_q_encoded_utf8() {
        assert_eq!(decode("=?UTF-8?Q?Caf=C3=A9?=").unwrap(), "Café");
    }

    #[test]
    fn test_decode_base64_encoded_word() {
        assert_eq!(decode("=?UTF-8?B?SG9sYSBtdW5kbw==?=").unwrap(), "Hola mundo");
    }

    #[test]
    fn test_decode_multiple_encoded_words() {
        let input = "=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?=";
        assert_eq!(decode(input).unwrap(), "Hola mundo");
    }

    #[test]
    fn test_decode_mixed_plain_and_encoded() {
        let input = "Re: =?UTF-8?B?SG9sYQ==?= there";
        assert_eq!(decode(input).unwrap(), "Re: Hola there");
    }

    #[test]
    fn test_decode_lowercase_encoding_and_hex() {
        assert_eq!(decode("=?utf-8?q?caf=c3=a9_au_lait?=").unwrap(), "café au lait");
    }

    #[test]
    fn test_plain_passthrough() {
        assert_eq!(decode("Normal subject").unwrap(), "Normal subject");
    }

    #[test]
    fn test_unsupported_charset_is_an_error() {
        let err = decode("=?UNKNOWN-CHARSET?Q?x?=").unwrap_err();
        assert!(
            matches!(&err, RenderError::UnsupportedCharset(c) if c == "UNKNOWN-CHARSET"),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn test_unterminated_word_passes_through() {
        assert_eq!(decode("=?UTF-8?Q?broken").unwrap(), "=?UTF-8?Q?broken");
    }

    #[test]
    fn test_bad_payload_passes_through() {
        // Invalid hex escape in Q, invalid base64 in B, unknown encoding letter
        assert_eq!(decode("=?UTF-8?Q?=ZZ?=").unwrap(), "=?UTF-8?Q?=ZZ?=");
        assert_eq!(decode("=?UTF-8?B?***?=").unwrap(), "=?UTF-8?B?***?=");
        assert_eq!(decode("=?UTF-8?X?abc?=").unwrap(), "=?UTF-8?X?abc?=");
    }

    #[test]
    fn test_bad_word_does_not_swallow_unknown_charset() {
        // The broken word is skipped, the next one is still checked
        let err = decode("=?UTF-8?Q?=ZZ?= =?x-nope?Q?a?=").unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedCharset(_)));
    }

    #[test]
    fn test_whitespace_kept_after_malformed_word() {
        let input = "=?UTF-8?X?a?= =?UTF-8?Q?b?=";
        assert_eq!(decode(input).unwrap(), "=?UTF-8?X?a?= b");
    }

    #[test]
    fn test_basic_policy_charsets() {
        let basic = HeaderDecoder::new(CharsetPolicy::Basic);
        assert_eq!(basic.decode("=?ISO-8859-1?Q?caf=E9?=").unwrap(), "café");
        assert_eq!(basic.decode("=?us-ascii?Q?a=FFb?=").unwrap(), "a\u{FFFD}b");
        assert!(matches!(
            basic.decode("=?Windows-1252?Q?M=FCller?="),
            Err(RenderError::UnsupportedCharset(_))
        ));
    }

    #[test]
    fn test_extended_policy_charsets() {
        let extended = HeaderDecoder::new(CharsetPolicy::Extended);
        assert_eq!(
            extended.decode("=?Windows-1252?Q?M=FCller?=").unwrap(),
            "Müller"
        );
        assert_eq!(
            extended.decode("=?ISO-8859-1?Q?R=E9sum=E9_du_projet?=").unwrap(),
            "Résumé du projet"
        );
    }

    #[test]
    fn test_leading_bom_does_not_override_charset() {
        let extended = HeaderDecoder::new(CharsetPolicy::Extended);
        assert_eq!(
            extended.decode("=?windows-1252?Q?=EF=BB=BFabc?=").unwrap(),
            "\u{EF}\u{BB}\u{BF}abc"
        );
        assert_eq!(
            extended.decode("=?utf-8?B?77u/YWJj?=").unwrap(),
            "\u{FEFF}abc"
        );
    }

    #[test]
    fn test_decode_utf8_base64_japanese() {
        // 山田太郎
        assert_eq!(decode("=?UTF-8?B?5bGx55Sw5aSq6YOO?=").unwrap(), "山田太郎");
    }
}

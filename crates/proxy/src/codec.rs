//! URL codecs understood by the proxy server
//!
//! The proxy decodes the path segment after its prefix with the same codec
//! the shell used to encode it, so both sides must agree on the variant.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;

use crate::error::{ProxyError, ProxyResult};

/// Encoding applied to a raw URL before it is appended to the proxy prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    /// Raw URL passed through untouched
    None,
    /// Whole URL percent-encoded as a single path component
    Plain,
    /// Odd-indexed characters XOR'ed with 2, then percent-encoded
    #[default]
    Xor,
    /// Base64 of the UTF-8 bytes, percent-encoded
    Base64,
}

impl Codec {
    /// Encode a raw URL into a path-safe token
    pub fn encode(&self, raw: &str) -> String {
        if raw.is_empty() {
            return String::new();
        }

        match self {
            Codec::None => raw.to_string(),
            Codec::Plain => urlencoding::encode(raw).into_owned(),
            Codec::Xor => urlencoding::encode(&xor_odd_chars(raw)).into_owned(),
            Codec::Base64 => urlencoding::encode(&STANDARD.encode(raw.as_bytes())).into_owned(),
        }
    }

    /// Decode a token produced by [`Codec::encode`]
    pub fn decode(&self, token: &str) -> ProxyResult<String> {
        if token.is_empty() {
            return Ok(String::new());
        }

        match self {
            Codec::None => Ok(token.to_string()),
            Codec::Plain => Ok(urlencoding::decode(token)?.into_owned()),
            Codec::Xor => {
                // The proxy appends its own query string verbatim after the token
                let (input, search) = match token.split_once('?') {
                    Some((input, search)) => (input, Some(search)),
                    None => (token, None),
                };

                let mut decoded = xor_odd_chars(&urlencoding::decode(input)?);
                if let Some(search) = search {
                    decoded.push('?');
                    decoded.push_str(search);
                }
                Ok(decoded)
            }
            Codec::Base64 => {
                let unescaped = urlencoding::decode(token)?;
                let bytes = STANDARD.decode(unescaped.as_bytes())?;
                Ok(String::from_utf8(bytes)?)
            }
        }
    }

    /// Codec name as used in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            Codec::None => "none",
            Codec::Plain => "plain",
            Codec::Xor => "xor",
            Codec::Base64 => "base64",
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Codec {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Codec::None),
            "plain" => Ok(Codec::Plain),
            "xor" => Ok(Codec::Xor),
            "base64" => Ok(Codec::Base64),
            other => Err(ProxyError::UnknownCodec(other.to_string())),
        }
    }
}

/// Flip bit 1 of every odd-indexed character. Self-inverse.
fn xor_odd_chars(input: &str) -> String {
    input
        .chars()
        .enumerate()
        .map(|(i, c)| {
            if i % 2 == 1 {
                char::from_u32(c as u32 ^ 2).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xor_encode_known_value() {
        let encoded = Codec::Xor.encode("https://example.com");
        assert_eq!(encoded, "hvtrs8%2F-ezaopne%2Ccmm");
    }

    #[test]
    fn test_xor_decode_keeps_query() {
        let decoded = Codec::Xor.decode("hvtrs8%2F-ezaopne%2Ccmm?a=1").unwrap();
        assert_eq!(decoded, "https://example.com?a=1");
    }

    #[test]
    fn test_xor_is_self_inverse() {
        let raw = "https://duckduckgo.com/?q=hello%20world";
        let token = Codec::Xor.encode(raw);
        assert!(!token.contains('/'));
        assert!(!token.contains('?'));
        assert_eq!(Codec::Xor.decode(&token).unwrap(), raw);
    }

    #[test]
    fn test_plain_escapes_separators() {
        let encoded = Codec::Plain.encode("https://a.com/x?y=1");
        assert_eq!(encoded, "https%3A%2F%2Fa.com%2Fx%3Fy%3D1");
        assert_eq!(Codec::Plain.decode(&encoded).unwrap(), "https://a.com/x?y=1");
    }

    #[test]
    fn test_base64_is_path_safe() {
        let encoded = Codec::Base64.encode("https://example.com/?q=ü");
        assert!(!encoded.contains('/'));
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('='));
        assert_eq!(Codec::Base64.decode(&encoded).unwrap(), "https://example.com/?q=ü");
    }

    #[test]
    fn test_base64_rejects_garbage() {
        assert!(matches!(
            Codec::Base64.decode("!!not-base64!!"),
            Err(ProxyError::Decode(_))
        ));
    }

    #[test]
    fn test_none_is_identity() {
        assert_eq!(Codec::None.encode("https://a.com/"), "https://a.com/");
    }

    #[test]
    fn test_empty_input() {
        for codec in [Codec::None, Codec::Plain, Codec::Xor, Codec::Base64] {
            assert_eq!(codec.encode(""), "");
            assert_eq!(codec.decode("").unwrap(), "");
        }
    }

    #[test]
    fn test_distinct_urls_encode_distinctly() {
        for codec in [Codec::Plain, Codec::Xor, Codec::Base64] {
            assert_ne!(codec.encode("https://a.com/"), codec.encode("https://b.com/"));
        }
    }

    #[test]
    fn test_parse_codec_name() {
        assert_eq!("XOR".parse::<Codec>().unwrap(), Codec::Xor);
        assert_eq!(" base64 ".parse::<Codec>().unwrap(), Codec::Base64);
        assert!(matches!("rot13".parse::<Codec>(), Err(ProxyError::UnknownCodec(_))));
    }

    #[test]
    fn test_deserialize_codec() {
        let codec: Codec = serde_json::from_str("\"plain\"").unwrap();
        assert_eq!(codec, Codec::Plain);
    }
}

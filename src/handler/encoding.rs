//! Text encodings accepted for custom response bodies.
//!
//! Encoding names follow the identifiers HTTP tooling commonly uses
//! (`utf8`, `latin1`, `hex`, ...). Matching is case-insensitive.

use std::fmt;
use std::str::FromStr;

use crate::handler::error::HandlerError;

/// Encoding applied to a text body before it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Ascii,
    /// One byte per char, `U+0000..=U+00FF`.
    Latin1,
    /// Text is a hex string; the decoded bytes are written.
    Hex,
    Utf16Le,
}

impl TextEncoding {
    /// Encode `text` into the bytes that go on the wire.
    pub fn encode(self, text: &str) -> Result<Vec<u8>, HandlerError> {
        match self {
            TextEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            TextEncoding::Ascii => {
                if text.is_ascii() {
                    Ok(text.as_bytes().to_vec())
                } else {
                    Err(HandlerError::Encoding(
                        "body contains non-ASCII characters".to_string(),
                    ))
                }
            }
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c)).map_err(|_| {
                        HandlerError::Encoding(format!("character {c:?} is outside latin1"))
                    })
                })
                .collect(),
            TextEncoding::Hex => {
                hex::decode(text).map_err(|e| HandlerError::Encoding(format!("invalid hex body: {e}")))
            }
            TextEncoding::Utf16Le => Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf8",
            TextEncoding::Ascii => "ascii",
            TextEncoding::Latin1 => "latin1",
            TextEncoding::Hex => "hex",
            TextEncoding::Utf16Le => "utf16le",
        }
    }
}

impl FromStr for TextEncoding {
    type Err = HandlerError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(TextEncoding::Utf8),
            "ascii" => Ok(TextEncoding::Ascii),
            "latin1" | "binary" => Ok(TextEncoding::Latin1),
            "hex" => Ok(TextEncoding::Hex),
            "utf16le" | "utf-16le" | "ucs2" | "ucs-2" => Ok(TextEncoding::Utf16Le),
            _ => Err(HandlerError::Encoding(format!("unknown encoding: {name}"))),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

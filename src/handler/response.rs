//! Responses produced by user generators.

use std::fmt;

use axum::body::Bytes;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::handler::encoding::TextEncoding;
use crate::handler::error::HandlerError;

/// Status code written when the generator leaves it unset.
pub const DEFAULT_STATUS: u16 = 200;

/// The payload a generator returns instead of an upstream response.
///
/// Every field is optional; `GeneratedResponse::default()` is the empty
/// object, which is a valid result and produces a bare `200`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedResponse {
    pub status_code: Option<u16>,
    pub body: Option<ResponseBody>,
    pub headers: ResponseHeaders,
    /// Only meaningful for [`ResponseBody::Text`].
    pub encoding: Option<String>,
}

impl GeneratedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_body(mut self, body: impl Into<ResponseBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }
}

/// Body of a generated response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    Text(String),
    Bytes(Bytes),
}

impl ResponseBody {
    /// UTF-16 code units for text bodies, bytes for binary ones.
    pub fn len(&self) -> usize {
        match self {
            ResponseBody::Text(text) => text.encode_utf16().count(),
            ResponseBody::Bytes(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert to wire bytes. `encoding` is ignored for binary bodies.
    pub fn encode(self, encoding: Option<&str>) -> Result<Bytes, HandlerError> {
        match self {
            ResponseBody::Bytes(bytes) => Ok(bytes),
            ResponseBody::Text(text) => {
                let encoding = match encoding {
                    Some(name) => name.parse::<TextEncoding>()?,
                    None => TextEncoding::default(),
                };
                match encoding {
                    TextEncoding::Utf8 => Ok(Bytes::from(text)),
                    other => other.encode(&text).map(Bytes::from),
                }
            }
        }
    }
}

impl From<String> for ResponseBody {
    fn from(text: String) -> Self {
        ResponseBody::Text(text)
    }
}

impl From<&str> for ResponseBody {
    fn from(text: &str) -> Self {
        ResponseBody::Text(text.to_string())
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        ResponseBody::Bytes(bytes)
    }
}

impl From<Vec<u8>> for ResponseBody {
    fn from(bytes: Vec<u8>) -> Self {
        ResponseBody::Bytes(Bytes::from(bytes))
    }
}

/// Header entries in insertion order.
///
/// Duplicate names are kept as separate entries; the sink decides how
/// repeated names combine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders(Vec<(String, String)>);

impl ResponseHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ResponseHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl Serialize for ResponseHeaders {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ResponseHeaders {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HeadersVisitor;

        impl<'de> Visitor<'de> for HeadersVisitor {
            type Value = ResponseHeaders;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a table of header names to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut headers = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, value)) = access.next_entry::<String, String>()? {
                    headers.push((name, value));
                }
                Ok(ResponseHeaders(headers))
            }
        }

        deserializer.deserialize_map(HeadersVisitor)
    }
}

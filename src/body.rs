//! Request body sources and their wire encodings.

use serde::Serialize;

use crate::{Error, Result};

pub(crate) const JSON: &str = "application/json";
pub(crate) const OCTET_STREAM: &str = "application/octet-stream";
pub(crate) const TEXT_PLAIN: &str = "text/plain";
pub(crate) const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// The body of a request.
///
/// Exactly one source is used per request. Each variant determines both the
/// bytes put on the wire and the `content-type` header the builder sets.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// A JSON document. Always sent as `application/json`.
    Json(serde_json::Value),
    /// Bytes passed through unchanged.
    Raw(Vec<u8>),
    /// A UTF-8 string.
    Text(String),
    /// Key/value pairs sent as `application/x-www-form-urlencoded`, in order.
    Form(Vec<(String, String)>),
}

impl Body {
    /// Serializes `value` into a JSON body.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the value cannot be represented as
    /// JSON (for example a map with non-string keys).
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Body::Json)
            .map_err(|e| Error::configuration(format!("Failed to serialize JSON body: {}", e)))
    }

    /// Creates a form body from key/value pairs.
    pub fn form<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Body::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns `true` if no body source was supplied.
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }

    /// The content type implied by this body, and whether it replaces a
    /// content type the caller set explicitly.
    pub(crate) fn content_type(&self) -> Option<(&'static str, bool)> {
        match self {
            Body::Empty => None,
            Body::Json(_) => Some((JSON, true)),
            Body::Raw(_) => Some((OCTET_STREAM, false)),
            Body::Text(_) => Some((TEXT_PLAIN, false)),
            Body::Form(_) => Some((FORM_URLENCODED, false)),
        }
    }

    /// Encodes the body into the bytes sent on the wire.
    pub(crate) fn encode(&self) -> Result<Vec<u8>> {
        match self {
            Body::Empty => Ok(Vec::new()),
            Body::Json(value) => serde_json::to_vec(value)
                .map_err(|e| Error::configuration(format!("Failed to serialize JSON body: {}", e))),
            Body::Raw(bytes) => Ok(bytes.clone()),
            Body::Text(text) => Ok(text.as_bytes().to_vec()),
            Body::Form(pairs) => Ok(encode_pairs(pairs).into_bytes()),
        }
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::Json(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Raw(bytes)
    }
}

impl From<&[u8]> for Body {
    fn from(bytes: &[u8]) -> Self {
        Body::Raw(bytes.to_vec())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

/// URL-encodes key/value pairs (`a=1&b=two+words`).
pub(crate) fn encode_pairs(pairs: &[(String, String)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

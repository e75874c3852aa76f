//! The normalized result of a request.
//!
//! Whatever happened during the retry loop, the caller receives one
//! [`Response`] built from the last response received: status, headers in two
//! shapes, the raw body, and a best-effort text decoding of it.

use encoding_rs::Encoding;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

use crate::transport::RawResponse;
use crate::{Error, Result};

/// The outcome of a request that received a response.
///
/// Error statuses are returned here too, with `ok == false`; check `ok` or
/// `status`, or call [`into_result`](Response::into_result).
///
/// # Examples
///
/// ```no_run
/// use entreat::RequestOptions;
///
/// # fn example() -> Result<(), entreat::Error> {
/// let response = entreat::get("https://api.example.com/users/1", RequestOptions::default())?;
///
/// println!("Status: {} (ok: {})", response.status, response.ok);
/// println!("Attempts: {}", response.attempts);
/// println!("Served from: {}", response.url);
/// if let Some(text) = &response.text {
///     println!("Body ({}): {}", response.encoding.as_deref().unwrap_or("?"), text);
/// }
/// for cookie in response.headers_multi.get("set-cookie").into_iter().flatten() {
///     println!("Cookie: {}", cookie);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// The HTTP status code.
    pub status: u16,

    /// `true` when the status is below 400.
    pub ok: bool,

    /// The URL of the final response, after redirects.
    pub url: String,

    /// The number of attempts made, at least 1.
    pub attempts: usize,

    /// Headers by lower-case name. When a name repeats, the last value wins.
    pub headers: HashMap<String, String>,

    /// Every value of every header by lower-case name, in arrival order.
    pub headers_multi: HashMap<String, Vec<String>>,

    /// The raw response body.
    pub body: Vec<u8>,

    /// The body decoded as text, if decoding succeeded.
    pub text: Option<String>,

    /// The name of the charset used for `text`; present exactly when `text` is.
    pub encoding: Option<String>,
}

impl Response {
    pub(crate) fn from_raw(raw: RawResponse, attempts: usize) -> Self {
        let mut headers = HashMap::new();
        let mut headers_multi: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in raw.headers {
            let name = name.to_ascii_lowercase();
            headers.insert(name.clone(), value.clone());
            headers_multi.entry(name).or_default().push(value);
        }

        let (text, encoding) = match decode_body(headers.get("content-type"), &raw.body) {
            Some((text, encoding)) => (Some(text), Some(encoding)),
            None => (None, None),
        };

        Self {
            status: raw.status,
            ok: raw.status < 400,
            url: raw.url,
            attempts,
            headers,
            headers_multi,
            body: raw.body,
            text,
            encoding,
        }
    }

    /// Returns `true` if the request needed more than one attempt.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// Returns the value of a header, matching the name case-insensitively.
    ///
    /// # Examples
    ///
    /// ```
    /// # use entreat::Response;
    /// # use std::collections::HashMap;
    /// # let response = Response {
    /// #     status: 200, ok: true, url: String::new(), attempts: 1,
    /// #     headers: HashMap::from([("content-type".to_string(), "application/json".to_string())]),
    /// #     headers_multi: HashMap::new(), body: Vec::new(), text: None, encoding: None,
    /// # };
    /// assert_eq!(response.header("Content-Type"), Some("application/json"));
    /// ```
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Parses the decoded body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Deserialization`] if the body could not be decoded as
    /// text or does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let text = self.text.as_deref().ok_or_else(|| Error::Deserialization {
            status: self.status,
            serde_error: "response body is not valid text".to_string(),
        })?;
        serde_json::from_str(text).map_err(|e| {
            tracing::error!(
                error = %e,
                status = self.status,
                raw_response = %text,
                "Failed to deserialize response"
            );
            Error::Deserialization {
                status: self.status,
                serde_error: e.to_string(),
            }
        })
    }

    /// Converts an error status into [`Error::Status`], for use with `?`.
    pub fn into_result(self) -> Result<Self> {
        if self.ok {
            Ok(self)
        } else {
            Err(Error::Status {
                status: self.status,
                url: self.url,
            })
        }
    }
}

/// Decodes `body` using the charset named in `content_type`, falling back to
/// UTF-8. Returns the text and the name of the charset used, or `None` if the
/// bytes are not valid in either.
fn decode_body(content_type: Option<&String>, body: &[u8]) -> Option<(String, String)> {
    if let Some(label) = content_type.and_then(|ct| charset_param(ct)) {
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(body)
            {
                return Some((text.into_owned(), label.to_ascii_lowercase()));
            }
        }
    }

    std::str::from_utf8(body)
        .ok()
        .map(|text| (text.to_string(), "utf-8".to_string()))
}

/// Extracts the `charset` parameter of a media type; the key is matched
/// case-insensitively and the value may be quoted.
fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            let value = value.trim().trim_matches('"');
            (!value.is_empty()).then_some(value)
        } else {
            None
        }
    })
}
